use std::sync::Arc;

use agora_db::{Collection, Connection, Database, Doc, Filter};
use agora_types::models::PointsAccount;
use agora_types::{ConceptError, Result, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

use crate::write_back;

const ACCOUNTS: Collection<PointsAccount> = Collection::new("points");

pub const DEFAULT_BALANCE: i64 = 100;

/// A streak survives as long as the account is touched again within this
/// many hours.
pub const STREAK_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialPoints {
    pub balance: i64,
    pub streak: u32,
}

impl Default for InitialPoints {
    fn default() -> Self {
        Self {
            balance: DEFAULT_BALANCE,
            streak: 0,
        }
    }
}

/// Both accounts after a successful transfer.
#[derive(Debug, Clone, Serialize)]
pub struct Transfer {
    pub sender: Doc<PointsAccount>,
    pub receiver: Doc<PointsAccount>,
}

/// One balance and streak counter per user.
///
/// Balances never go negative, and a transfer moves points without creating
/// or destroying any: debit and credit commit together or not at all.
pub struct PointsConcept {
    db: Arc<Database>,
}

impl PointsConcept {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn initialize_points(&self, user: UserId, initial: InitialPoints) -> Result<Doc<PointsAccount>> {
        if initial.balance < 0 {
            return Err(ConceptError::invalid("Initial balance cannot be negative"));
        }

        self.db.transaction(|tx| {
            if ACCOUNTS.read_one(tx, &by_user(user))?.is_some() {
                return Err(ConceptError::duplicate(format!(
                    "User {} already has a points account",
                    user
                )));
            }

            let account = ACCOUNTS.create(
                tx,
                PointsAccount {
                    user,
                    balance: initial.balance,
                    streak: initial.streak,
                },
            )?;
            info!(%user, balance = initial.balance, "Points account created");
            Ok(account)
        })
    }

    pub fn get_points(&self, user: UserId) -> Result<Doc<PointsAccount>> {
        self.db.transaction(|tx| load(tx, user))
    }

    /// Time of the last write to the account. Any balance or streak change
    /// counts as activity.
    pub fn last_updated(&self, user: UserId) -> Result<DateTime<Utc>> {
        Ok(self.get_points(user)?.updated_at)
    }

    pub fn add_points(&self, user: UserId, amount: i64) -> Result<Doc<PointsAccount>> {
        self.db.transaction(|tx| credit(tx, user, amount))
    }

    pub fn sub_points(&self, user: UserId, amount: i64) -> Result<Doc<PointsAccount>> {
        self.db.transaction(|tx| debit(tx, user, amount))
    }

    /// Sending to yourself debits and credits the same account, so it only
    /// succeeds when the balance covers `amount` and leaves it unchanged.
    pub fn send_points(&self, sender: UserId, receiver: UserId, amount: i64) -> Result<Transfer> {
        // Debit and credit share one transaction; an error from either one
        // drops it and neither balance moves.
        let transfer = self.db.transaction(|tx| {
            let debited = debit(tx, sender, amount)?;
            let credited = credit(tx, receiver, amount)?;
            Ok::<_, ConceptError>(Transfer {
                sender: if sender == receiver { credited.clone() } else { debited },
                receiver: credited,
            })
        })?;

        info!(%sender, %receiver, amount, "Points sent");
        Ok(transfer)
    }

    pub fn add_streak(&self, user: UserId) -> Result<Doc<PointsAccount>> {
        self.db.transaction(|tx| {
            let mut account = load(tx, user)?;
            account.streak = account.streak.saturating_add(1);
            write_back(&ACCOUNTS, tx, &mut account)?;
            Ok(account)
        })
    }

    pub fn reset_streak(&self, user: UserId) -> Result<Doc<PointsAccount>> {
        self.db.transaction(|tx| {
            let mut account = load(tx, user)?;
            account.streak = 0;
            write_back(&ACCOUNTS, tx, &mut account)?;
            Ok(account)
        })
    }

    /// Login bookkeeping: extend the streak if the account was touched within
    /// the window, otherwise start over. Compare and write happen in one
    /// transaction.
    pub fn refresh_streak(&self, user: UserId, now: DateTime<Utc>) -> Result<Doc<PointsAccount>> {
        self.db.transaction(|tx| {
            let mut account = load(tx, user)?;

            if now - account.updated_at > Duration::hours(STREAK_WINDOW_HOURS) {
                account.streak = 0;
                info!(%user, "Streak lapsed");
            } else {
                account.streak = account.streak.saturating_add(1);
            }

            write_back(&ACCOUNTS, tx, &mut account)?;
            Ok(account)
        })
    }

    pub fn delete_points(&self, user: UserId) -> Result<()> {
        let removed = self.db.with_conn(|conn| ACCOUNTS.delete_one(conn, &by_user(user)))?;
        if !removed {
            return Err(no_account(user));
        }

        info!(%user, "Points account deleted");
        Ok(())
    }
}

fn by_user(user: UserId) -> Filter {
    Filter::eq("user", user)
}

fn load(conn: &Connection, user: UserId) -> Result<Doc<PointsAccount>> {
    ACCOUNTS
        .read_one(conn, &by_user(user))?
        .ok_or_else(|| no_account(user))
}

fn no_account(user: UserId) -> ConceptError {
    ConceptError::not_found(format!("User {} has no points account", user))
}

fn check_amount(amount: i64) -> Result<()> {
    if amount < 0 {
        return Err(ConceptError::invalid(format!(
            "Amount must be non-negative, got {}",
            amount
        )));
    }
    Ok(())
}

fn credit(conn: &Connection, user: UserId, amount: i64) -> Result<Doc<PointsAccount>> {
    check_amount(amount)?;
    let mut account = load(conn, user)?;

    account.balance = account
        .balance
        .checked_add(amount)
        .ok_or_else(|| ConceptError::invalid("Balance would overflow"))?;
    write_back(&ACCOUNTS, conn, &mut account)?;
    Ok(account)
}

fn debit(conn: &Connection, user: UserId, amount: i64) -> Result<Doc<PointsAccount>> {
    check_amount(amount)?;
    let mut account = load(conn, user)?;

    if amount > account.balance {
        return Err(ConceptError::InsufficientBalance {
            requested: amount,
            available: account.balance,
        });
    }

    account.balance -= amount;
    write_back(&ACCOUNTS, conn, &mut account)?;
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::db;
    use agora_types::{ErrorKind, Id};

    fn with_balance(points: &PointsConcept, balance: i64) -> UserId {
        let user = Id::new();
        points
            .initialize_points(user, InitialPoints { balance, streak: 0 })
            .unwrap();
        user
    }

    fn balance(points: &PointsConcept, user: UserId) -> i64 {
        points.get_points(user).unwrap().balance
    }

    #[test]
    fn defaults_to_hundred_points() {
        let points = PointsConcept::new(db());
        let user = Id::new();
        let account = points.initialize_points(user, InitialPoints::default()).unwrap();
        assert_eq!(account.balance, 100);
        assert_eq!(account.streak, 0);
    }

    #[test]
    fn one_account_per_user() {
        let points = PointsConcept::new(db());
        let user = with_balance(&points, 10);
        let err = points
            .initialize_points(user, InitialPoints::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
    }

    #[test]
    fn transfer_moves_points_or_nothing() {
        let points = PointsConcept::new(db());
        let a = with_balance(&points, 100);
        let b = with_balance(&points, 50);

        let transfer = points.send_points(a, b, 30).unwrap();
        assert_eq!(transfer.sender.balance, 70);
        assert_eq!(transfer.receiver.balance, 80);

        let err = points.send_points(a, b, 1000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert_eq!(balance(&points, a), 70);
        assert_eq!(balance(&points, b), 80);
    }

    #[test]
    fn failed_credit_rolls_back_debit() {
        let points = PointsConcept::new(db());
        let a = with_balance(&points, 100);

        let err = points.send_points(a, Id::new(), 40).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(balance(&points, a), 100);
    }

    #[test]
    fn overflowing_credit_rolls_back_debit() {
        let points = PointsConcept::new(db());
        let a = with_balance(&points, 10);
        let rich = with_balance(&points, i64::MAX);

        let err = points.send_points(a, rich, 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(balance(&points, a), 10);
        assert_eq!(balance(&points, rich), i64::MAX);
    }

    #[test]
    fn negative_amounts_are_invalid() {
        let points = PointsConcept::new(db());
        let a = with_balance(&points, 10);
        let b = with_balance(&points, 10);

        assert_eq!(points.add_points(a, -1).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(points.sub_points(a, -1).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(points.send_points(a, b, -5).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(balance(&points, b), 10);
    }

    #[test]
    fn sub_points_never_goes_negative() {
        let points = PointsConcept::new(db());
        let a = with_balance(&points, 10);

        assert_eq!(points.sub_points(a, 10).unwrap().balance, 0);
        let err = points.sub_points(a, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert_eq!(points.add_points(a, 5).unwrap().balance, 5);
    }

    #[test]
    fn streak_counts_and_resets() {
        let points = PointsConcept::new(db());
        let a = with_balance(&points, 0);

        points.add_streak(a).unwrap();
        assert_eq!(points.add_streak(a).unwrap().streak, 2);
        assert_eq!(points.reset_streak(a).unwrap().streak, 0);
    }

    #[test]
    fn refresh_streak_applies_the_window() {
        let points = PointsConcept::new(db());
        let a = with_balance(&points, 0);

        let soon = points.last_updated(a).unwrap() + Duration::hours(1);
        assert_eq!(points.refresh_streak(a, soon).unwrap().streak, 1);
        assert_eq!(points.add_streak(a).unwrap().streak, 2);

        let late = points.last_updated(a).unwrap() + Duration::hours(25);
        assert_eq!(points.refresh_streak(a, late).unwrap().streak, 0);
    }

    #[test]
    fn sending_to_yourself_is_balance_neutral() {
        let points = PointsConcept::new(db());
        let a = with_balance(&points, 40);

        let transfer = points.send_points(a, a, 25).unwrap();
        assert_eq!(transfer.sender.balance, 40);
        assert_eq!(transfer.receiver.balance, 40);
        assert_eq!(balance(&points, a), 40);

        let err = points.send_points(a, a, 41).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert_eq!(balance(&points, a), 40);
    }

    #[test]
    fn parallel_transfers_conserve_total() {
        let points = PointsConcept::new(db());
        // Enough for one side to fund every transfer before the other starts.
        let a = with_balance(&points, 3000);
        let b = with_balance(&points, 3000);

        std::thread::scope(|s| {
            for i in 0..16 {
                let points = &points;
                let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
                s.spawn(move || {
                    for _ in 0..50 {
                        points.send_points(from, to, 7).unwrap();
                    }
                });
            }
        });

        assert_eq!(balance(&points, a) + balance(&points, b), 6000);
        assert_eq!(balance(&points, a), 3000);
    }

    #[test]
    fn parallel_credits_are_not_lost() {
        let points = PointsConcept::new(db());
        let a = with_balance(&points, 0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                let points = &points;
                s.spawn(move || {
                    for _ in 0..25 {
                        points.add_points(a, 1).unwrap();
                    }
                });
            }
        });

        assert_eq!(balance(&points, a), 200);
    }

    #[test]
    fn delete_points_removes_account() {
        let points = PointsConcept::new(db());
        let a = with_balance(&points, 0);

        points.delete_points(a).unwrap();
        assert_eq!(points.get_points(a).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(points.delete_points(a).unwrap_err().kind(), ErrorKind::NotFound);
    }
}
