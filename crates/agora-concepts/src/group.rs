use std::sync::Arc;

use agora_db::{Collection, Connection, Database, Doc, Filter};
use agora_types::models::Group;
use agora_types::{ConceptError, Id, PostId, Result, UserId};
use serde::Serialize;
use tracing::info;

use crate::write_back;

const GROUPS: Collection<Group> = Collection::new("groups");

/// Result of an invite. Inviting someone who already lives in the group is
/// not an error, it just changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Invited {
    Added,
    AlreadyResident,
}

/// Group membership, ownership and privacy.
///
/// The owner is always a resident: ownership only moves to an existing
/// resident, and the owner cannot be removed while they hold it.
pub struct GroupConcept {
    db: Arc<Database>,
}

impl GroupConcept {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create_group(&self, owner: UserId, private: bool, censored_word_list: Id) -> Result<Doc<Group>> {
        let group = self
            .db
            .with_conn(|conn| GROUPS.create(conn, Group::new(owner, private, censored_word_list)))?;

        info!(group = %group.id, %owner, "Group created");
        Ok(group)
    }

    pub fn get_group(&self, id: Id) -> Result<Doc<Group>> {
        self.db.transaction(|tx| load(tx, id))
    }

    pub fn get_all_groups(&self) -> Result<Vec<Doc<Group>>> {
        Ok(self.db.with_conn(|conn| GROUPS.read_many(conn, &Filter::All))?)
    }

    pub fn get_groups_by_resident(&self, user: UserId) -> Result<Vec<Doc<Group>>> {
        Ok(self
            .db
            .with_conn(|conn| GROUPS.read_many(conn, &Filter::contains("residents", user)))?)
    }

    pub fn invite(&self, id: Id, inviter: UserId, invitee: UserId) -> Result<Invited> {
        self.db.transaction(|tx| {
            let mut group = load(tx, id)?;
            require_resident(&group, inviter, "invite to")?;

            if group.is_resident(invitee) {
                return Ok(Invited::AlreadyResident);
            }

            group.residents.push(invitee);
            write_back(&GROUPS, tx, &mut group)?;

            info!(group = %id, %inviter, %invitee, "Resident added");
            Ok(Invited::Added)
        })
    }

    /// Remove `target` from the group. Removing someone who is not a resident
    /// is a no-op; removing the owner is refused.
    pub fn delete_user(&self, id: Id, initiator: UserId, target: UserId) -> Result<Doc<Group>> {
        self.db.transaction(|tx| {
            let mut group = load(tx, id)?;
            require_resident(&group, initiator, "remove residents from")?;

            if target == group.owner {
                return Err(ConceptError::not_allowed(
                    "The owner cannot be removed; transfer ownership first",
                ));
            }
            if !group.is_resident(target) {
                return Ok(group);
            }

            group.residents.retain(|r| *r != target);
            write_back(&GROUPS, tx, &mut group)?;

            info!(group = %id, %initiator, %target, "Resident removed");
            Ok(group)
        })
    }

    /// Delete the group and hand back its last state, so the caller can clean
    /// up what it references (the word list).
    pub fn delete_group(&self, id: Id, initiator: UserId) -> Result<Doc<Group>> {
        self.db.transaction(|tx| {
            let group = load(tx, id)?;
            require_resident(&group, initiator, "delete")?;

            GROUPS.delete_one(tx, &Filter::id(id))?;

            info!(group = %id, %initiator, "Group deleted");
            Ok(group)
        })
    }

    pub fn give_ownership(&self, id: Id, current_owner: UserId, new_owner: UserId) -> Result<Doc<Group>> {
        self.db.transaction(|tx| {
            let mut group = load(tx, id)?;

            if group.owner != current_owner {
                return Err(ConceptError::not_allowed(format!(
                    "{} does not own group {}",
                    current_owner, id
                )));
            }
            if !group.is_resident(new_owner) {
                return Err(ConceptError::not_allowed(format!(
                    "{} must be a resident of group {} to own it",
                    new_owner, id
                )));
            }

            group.owner = new_owner;
            write_back(&GROUPS, tx, &mut group)?;

            info!(group = %id, from = %current_owner, to = %new_owner, "Ownership transferred");
            Ok(group)
        })
    }

    pub fn change_privacy(&self, id: Id, actor: UserId, private: bool) -> Result<Doc<Group>> {
        self.db.transaction(|tx| {
            let mut group = load(tx, id)?;
            require_resident(&group, actor, "change the privacy of")?;

            if group.private != private {
                group.private = private;
                write_back(&GROUPS, tx, &mut group)?;
                info!(group = %id, %actor, private, "Privacy changed");
            }
            Ok(group)
        })
    }

    pub fn add_post(&self, id: Id, author: UserId, post: PostId) -> Result<Doc<Group>> {
        self.db.transaction(|tx| {
            let mut group = load(tx, id)?;
            require_resident(&group, author, "post in")?;

            if group.posts.contains(&post) {
                return Err(ConceptError::duplicate(format!(
                    "Post {} is already in group {}",
                    post, id
                )));
            }

            group.posts.push(post);
            write_back(&GROUPS, tx, &mut group)?;
            Ok(group)
        })
    }

    pub fn remove_post(&self, id: Id, actor: UserId, post: PostId) -> Result<Doc<Group>> {
        self.db.transaction(|tx| {
            let mut group = load(tx, id)?;
            require_resident(&group, actor, "remove posts from")?;

            if !group.posts.contains(&post) {
                return Err(ConceptError::not_found(format!(
                    "Post {} is not in group {}",
                    post, id
                )));
            }

            group.posts.retain(|p| *p != post);
            write_back(&GROUPS, tx, &mut group)?;
            Ok(group)
        })
    }
}

fn load(conn: &Connection, id: Id) -> Result<Doc<Group>> {
    GROUPS
        .read_one(conn, &Filter::id(id))?
        .ok_or_else(|| ConceptError::not_found(format!("Group {} not found", id)))
}

fn require_resident(group: &Doc<Group>, user: UserId, action: &str) -> Result<()> {
    if group.is_resident(user) {
        Ok(())
    } else {
        Err(ConceptError::not_allowed(format!(
            "Only residents can {} group {}",
            action, group.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::db;
    use agora_types::ErrorKind;

    fn setup() -> (GroupConcept, Doc<Group>, UserId) {
        let groups = GroupConcept::new(db());
        let owner = Id::new();
        let group = groups.create_group(owner, false, Id::new()).unwrap();
        (groups, group, owner)
    }

    fn assert_owner_resident(group: &Group) {
        assert!(group.residents.contains(&group.owner));
        let mut unique = group.residents.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), group.residents.len());
    }

    #[test]
    fn invite_adds_once() {
        let (groups, group, owner) = setup();
        let guest = Id::new();

        assert_eq!(groups.invite(group.id, owner, guest).unwrap(), Invited::Added);
        assert_eq!(
            groups.invite(group.id, owner, guest).unwrap(),
            Invited::AlreadyResident
        );

        let stored = groups.get_group(group.id).unwrap();
        assert_eq!(stored.residents, vec![owner, guest]);
        assert_owner_resident(&stored);
    }

    #[test]
    fn parallel_invites_all_land() {
        let (groups, group, owner) = setup();
        let guests: Vec<UserId> = (0..16).map(|_| Id::new()).collect();
        let id = group.id;

        std::thread::scope(|s| {
            for guest in &guests {
                let groups = &groups;
                s.spawn(move || {
                    assert_eq!(groups.invite(id, owner, *guest).unwrap(), Invited::Added);
                });
            }
        });

        let stored = groups.get_group(id).unwrap();
        assert_eq!(stored.residents.len(), guests.len() + 1);
        assert!(guests.iter().all(|g| stored.is_resident(*g)));
        assert_owner_resident(&stored);
    }

    #[test]
    fn outsiders_cannot_invite() {
        let (groups, group, _) = setup();
        let err = groups.invite(group.id, Id::new(), Id::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAllowed);
    }

    #[test]
    fn missing_group_is_not_found() {
        let (groups, _, owner) = setup();
        let err = groups.invite(Id::new(), owner, Id::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn owner_cannot_be_removed() {
        let (groups, group, owner) = setup();
        let guest = Id::new();
        groups.invite(group.id, owner, guest).unwrap();

        let err = groups.delete_user(group.id, guest, owner).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAllowed);
        assert_owner_resident(&groups.get_group(group.id).unwrap());
    }

    #[test]
    fn delete_user_is_idempotent() {
        let (groups, group, owner) = setup();
        let guest = Id::new();
        groups.invite(group.id, owner, guest).unwrap();

        let after = groups.delete_user(group.id, owner, guest).unwrap();
        assert_eq!(after.residents, vec![owner]);
        let again = groups.delete_user(group.id, owner, guest).unwrap();
        assert_eq!(again.version, after.version);
    }

    #[test]
    fn ownership_moves_only_to_residents() {
        let (groups, group, owner) = setup();
        let guest = Id::new();

        let err = groups.give_ownership(group.id, owner, guest).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAllowed);

        groups.invite(group.id, owner, guest).unwrap();
        let err = groups.give_ownership(group.id, guest, guest).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAllowed);

        let moved = groups.give_ownership(group.id, owner, guest).unwrap();
        assert_eq!(moved.owner, guest);
        assert_owner_resident(&moved);

        // The old owner is an ordinary resident now and can be removed.
        let after = groups.delete_user(group.id, guest, owner).unwrap();
        assert_eq!(after.residents, vec![guest]);
        assert_owner_resident(&after);
    }

    #[test]
    fn privacy_changes_need_residency() {
        let (groups, group, owner) = setup();

        let err = groups.change_privacy(group.id, Id::new(), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAllowed);

        assert!(groups.change_privacy(group.id, owner, true).unwrap().private);
    }

    #[test]
    fn groups_by_resident() {
        let (groups, group, owner) = setup();
        let guest = Id::new();
        groups.create_group(guest, true, Id::new()).unwrap();
        groups.invite(group.id, owner, guest).unwrap();

        assert_eq!(groups.get_groups_by_resident(guest).unwrap().len(), 2);
        assert_eq!(groups.get_groups_by_resident(owner).unwrap().len(), 1);
        assert_eq!(groups.get_all_groups().unwrap().len(), 2);
    }

    #[test]
    fn delete_group_requires_residency() {
        let (groups, group, owner) = setup();

        let err = groups.delete_group(group.id, Id::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAllowed);

        let deleted = groups.delete_group(group.id, owner).unwrap();
        assert_eq!(deleted.id, group.id);
        assert_eq!(
            groups.get_group(group.id).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn posts_are_tracked_once() {
        let (groups, group, owner) = setup();
        let post = Id::new();

        groups.add_post(group.id, owner, post).unwrap();
        let err = groups.add_post(group.id, owner, post).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);

        let after = groups.remove_post(group.id, owner, post).unwrap();
        assert!(after.posts.is_empty());
        let err = groups.remove_post(group.id, owner, post).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
