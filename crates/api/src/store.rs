//! In-memory storage for staff accounts, customer accounts, ledger entries
//! and orders.
//!
//! The store also serves as the [`AccountDirectory`] the authorizer reads
//! live account state from. Only staff accounts are visible through it;
//! customers hold no role and never pass authorization.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use backoffice_auth::{AccountDirectory, AccountRecord, DirectoryError, Role};
use backoffice_core::{AccountId, Amount, DomainError, EntryId, OrderId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

/// Stored admin account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminAccount {
    pub id: AccountId,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub phonenumber: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub enabled: bool,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl AdminAccount {
    /// New accounts start disabled and unverified.
    pub fn new(username: impl Into<String>, password_hash: String, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id: AccountId::new(),
            username: username.into(),
            password_hash,
            firstname: None,
            lastname: None,
            phonenumber: None,
            email: None,
            role,
            enabled: false,
            verified: false,
            created_at: now,
        }
    }

    pub fn record(&self) -> AccountRecord {
        AccountRecord {
            id: self.id,
            role: self.role,
            enabled: self.enabled,
            verified: self.verified,
        }
    }
}

/// Self-registered customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerAccount {
    pub id: AccountId,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub phonenumber: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl CustomerAccount {
    /// New customers start enabled but unverified.
    pub fn new(username: impl Into<String>, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: AccountId::new(),
            username: username.into(),
            password_hash,
            firstname: None,
            lastname: None,
            phonenumber: None,
            email: None,
            enabled: true,
            verified: false,
            created_at: now,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    Revenue,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    #[serde(rename = "type")]
    pub kind: LedgerKind,
    pub title: String,
    pub cost: Amount,
    pub detail: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderProcess {
    #[default]
    Placed,
    Approved,
}

impl OrderProcess {
    pub const NAMES: [&'static str; 2] = ["placed", "approved"];
}

impl core::str::FromStr for OrderProcess {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(OrderProcess::Placed),
            "approved" => Ok(OrderProcess::Approved),
            other => Err(DomainError::validation(format!("unknown order process '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer: AccountId,
    pub process: OrderProcess,
    pub detail: String,
    pub comment: Option<String>,
    pub value: Option<Amount>,
    pub date_ordered: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Store {
    accounts: RwLock<HashMap<AccountId, AdminAccount>>,
    customers: RwLock<HashMap<AccountId, CustomerAccount>>,
    entries: RwLock<Vec<LedgerEntry>>,
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_count(&self) -> Result<usize, StoreError> {
        Ok(self.accounts.read().map_err(poisoned)?.len())
    }

    /// Insert `account` only if the store holds no accounts yet.
    pub fn bootstrap(&self, account: AdminAccount) -> Result<AdminAccount, StoreError> {
        let mut map = self.accounts.write().map_err(poisoned)?;
        if !map.is_empty() {
            return Err(StoreError::Conflict("accounts already exist".to_string()));
        }
        map.insert(account.id, account.clone());
        Ok(account)
    }

    /// Insert a new account; usernames are unique.
    pub fn insert_account(&self, account: AdminAccount) -> Result<AdminAccount, StoreError> {
        let mut map = self.accounts.write().map_err(poisoned)?;
        if map.values().any(|a| a.username == account.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already registered",
                account.username
            )));
        }
        map.insert(account.id, account.clone());
        Ok(account)
    }

    pub fn account(&self, id: AccountId) -> Result<Option<AdminAccount>, StoreError> {
        Ok(self.accounts.read().map_err(poisoned)?.get(&id).cloned())
    }

    pub fn account_by_username(&self, username: &str) -> Result<Option<AdminAccount>, StoreError> {
        let map = self.accounts.read().map_err(poisoned)?;
        Ok(map.values().find(|a| a.username == username).cloned())
    }

    /// Apply `change` to a stored account and return the updated copy.
    pub fn update_account(
        &self,
        id: AccountId,
        change: impl FnOnce(&mut AdminAccount),
    ) -> Result<AdminAccount, StoreError> {
        let mut map = self.accounts.write().map_err(poisoned)?;
        let account = map.get_mut(&id).ok_or(StoreError::NotFound)?;
        change(account);
        Ok(account.clone())
    }

    pub fn remove_account(&self, id: AccountId) -> Result<AdminAccount, StoreError> {
        self.accounts
            .write()
            .map_err(poisoned)?
            .remove(&id)
            .ok_or(StoreError::NotFound)
    }

    /// Accounts holding any of `roles`, ordered by username.
    pub fn accounts_in_roles(&self, roles: &[Role]) -> Result<Vec<AdminAccount>, StoreError> {
        let map = self.accounts.read().map_err(poisoned)?;
        let mut found: Vec<AdminAccount> = map
            .values()
            .filter(|a| roles.contains(&a.role))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(found)
    }

    /// Insert a new customer; usernames are unique among customers.
    pub fn insert_customer(&self, customer: CustomerAccount) -> Result<CustomerAccount, StoreError> {
        let mut map = self.customers.write().map_err(poisoned)?;
        if map.values().any(|c| c.username == customer.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already registered",
                customer.username
            )));
        }
        map.insert(customer.id, customer.clone());
        Ok(customer)
    }

    pub fn customer(&self, id: AccountId) -> Result<Option<CustomerAccount>, StoreError> {
        Ok(self.customers.read().map_err(poisoned)?.get(&id).cloned())
    }

    pub fn customer_by_username(&self, username: &str) -> Result<Option<CustomerAccount>, StoreError> {
        let map = self.customers.read().map_err(poisoned)?;
        Ok(map.values().find(|c| c.username == username).cloned())
    }

    /// Every customer, ordered by username.
    pub fn customers(&self) -> Result<Vec<CustomerAccount>, StoreError> {
        let mut found: Vec<CustomerAccount> = self.customers.read().map_err(poisoned)?.values().cloned().collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(found)
    }

    pub fn update_customer(
        &self,
        id: AccountId,
        change: impl FnOnce(&mut CustomerAccount),
    ) -> Result<CustomerAccount, StoreError> {
        let mut map = self.customers.write().map_err(poisoned)?;
        let customer = map.get_mut(&id).ok_or(StoreError::NotFound)?;
        change(customer);
        Ok(customer.clone())
    }

    pub fn remove_customer(&self, id: AccountId) -> Result<CustomerAccount, StoreError> {
        self.customers
            .write()
            .map_err(poisoned)?
            .remove(&id)
            .ok_or(StoreError::NotFound)
    }

    pub fn add_entry(&self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        self.entries.write().map_err(poisoned)?.push(entry.clone());
        Ok(entry)
    }

    /// Entries in insertion order, optionally restricted to one kind and to
    /// those dated in `[since, now)`.
    pub fn entries(
        &self,
        kind: Option<LedgerKind>,
        since: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .iter()
            .filter(|e| kind.is_none_or(|k| e.kind == k))
            .filter(|e| in_window(e.date, since, now))
            .cloned()
            .collect())
    }

    pub fn insert_order(&self, order: Order) -> Result<Order, StoreError> {
        self.orders.write().map_err(poisoned)?.insert(order.id, order.clone());
        Ok(order)
    }

    /// Orders, oldest first, optionally for one customer and dated in `[since, now)`.
    pub fn orders(
        &self,
        customer: Option<AccountId>,
        since: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError> {
        let map = self.orders.read().map_err(poisoned)?;
        let mut found: Vec<Order> = map
            .values()
            .filter(|o| customer.is_none_or(|c| o.customer == c))
            .filter(|o| in_window(o.date_ordered, since, now))
            .cloned()
            .collect();
        found.sort_by_key(|o| (o.date_ordered, o.id));
        Ok(found)
    }

    pub fn update_order(&self, id: OrderId, change: impl FnOnce(&mut Order)) -> Result<Order, StoreError> {
        let mut map = self.orders.write().map_err(poisoned)?;
        let order = map.get_mut(&id).ok_or(StoreError::NotFound)?;
        change(order);
        Ok(order.clone())
    }
}

fn in_window(at: DateTime<Utc>, since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match since {
        None => true,
        Some(since) => at >= since && at < now,
    }
}

#[async_trait]
impl AccountDirectory for Store {
    async fn find_account_by_id(&self, id: AccountId) -> Result<Option<AccountRecord>, DirectoryError> {
        let map = self
            .accounts
            .read()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;
        Ok(map.get(&id).map(AdminAccount::record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn admin(username: &str, role: Role) -> AdminAccount {
        AdminAccount::new(username, "hash".to_string(), role, Utc::now())
    }

    fn entry(kind: LedgerKind, cents: i64, date: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id: EntryId::new(),
            kind,
            title: "t".to_string(),
            cost: Amount::from_cents(cents).unwrap(),
            detail: "d".to_string(),
            date,
        }
    }

    #[test]
    fn bootstrap_only_into_empty_store() {
        let store = Store::new();
        store.bootstrap(admin("root", Role::Administrator)).unwrap();
        assert!(matches!(
            store.bootstrap(admin("other", Role::Administrator)),
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.account_count().unwrap(), 1);
    }

    #[test]
    fn usernames_are_unique() {
        let store = Store::new();
        store.insert_account(admin("alice", Role::Support)).unwrap();
        assert!(matches!(
            store.insert_account(admin("alice", Role::Owner)),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn update_and_remove_missing_account() {
        let store = Store::new();
        assert_eq!(
            store.update_account(AccountId::new(), |a| a.enabled = true),
            Err(StoreError::NotFound)
        );
        assert_eq!(store.remove_account(AccountId::new()), Err(StoreError::NotFound));
    }

    #[test]
    fn accounts_in_roles_sorted_by_username() {
        let store = Store::new();
        store.insert_account(admin("zed", Role::Support)).unwrap();
        store.insert_account(admin("amy", Role::HeadDepartment)).unwrap();
        store.insert_account(admin("bob", Role::Owner)).unwrap();

        let names: Vec<String> = store
            .accounts_in_roles(&[Role::Support, Role::HeadDepartment])
            .unwrap()
            .into_iter()
            .map(|a| a.username)
            .collect();
        assert_eq!(names, vec!["amy", "zed"]);
    }

    #[test]
    fn entries_filter_by_kind_and_window() {
        let store = Store::new();
        let now = Utc::now();
        store.add_entry(entry(LedgerKind::Revenue, 100, now - Duration::days(10))).unwrap();
        store.add_entry(entry(LedgerKind::Revenue, 200, now - Duration::hours(1))).unwrap();
        store.add_entry(entry(LedgerKind::Expense, 50, now - Duration::hours(2))).unwrap();

        assert_eq!(store.entries(None, None, now).unwrap().len(), 3);
        assert_eq!(store.entries(Some(LedgerKind::Expense), None, now).unwrap().len(), 1);

        let recent = store.entries(Some(LedgerKind::Revenue), Some(now - Duration::days(1)), now).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].cost.cents(), 200);
    }

    fn order(customer: AccountId, date: DateTime<Utc>) -> Order {
        Order {
            id: OrderId::new(),
            customer,
            process: OrderProcess::Placed,
            detail: "detail".to_string(),
            comment: None,
            value: None,
            date_ordered: date,
            date_modified: date,
        }
    }

    #[test]
    fn customers_are_unique_and_sorted() {
        let store = Store::new();
        store.insert_customer(CustomerAccount::new("zoe", "h".to_string(), Utc::now())).unwrap();
        let amy = store.insert_customer(CustomerAccount::new("amy", "h".to_string(), Utc::now())).unwrap();
        assert!(matches!(
            store.insert_customer(CustomerAccount::new("amy", "h".to_string(), Utc::now())),
            Err(StoreError::Conflict(_))
        ));

        let names: Vec<String> = store.customers().unwrap().into_iter().map(|c| c.username).collect();
        assert_eq!(names, vec!["amy", "zoe"]);
        assert!(amy.enabled && !amy.verified);

        assert_eq!(store.customer_by_username("amy").unwrap().map(|c| c.id), Some(amy.id));
        store.remove_customer(amy.id).unwrap();
        assert_eq!(store.customer(amy.id).unwrap(), None);
        assert_eq!(store.remove_customer(amy.id), Err(StoreError::NotFound));
    }

    #[test]
    fn staff_and_customer_usernames_are_separate() {
        let store = Store::new();
        store.insert_account(admin("sam", Role::Support)).unwrap();
        store.insert_customer(CustomerAccount::new("sam", "h".to_string(), Utc::now())).unwrap();
        assert_eq!(store.account_count().unwrap(), 1);
    }

    #[test]
    fn orders_filter_by_customer_and_window() {
        let store = Store::new();
        let now = Utc::now();
        let (alice, bob) = (AccountId::new(), AccountId::new());
        store.insert_order(order(alice, now - Duration::days(3))).unwrap();
        store.insert_order(order(alice, now - Duration::hours(1))).unwrap();
        store.insert_order(order(bob, now - Duration::hours(2))).unwrap();

        assert_eq!(store.orders(None, None, now).unwrap().len(), 3);
        assert_eq!(store.orders(Some(alice), None, now).unwrap().len(), 2);
        assert_eq!(store.orders(Some(alice), Some(now - Duration::days(1)), now).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn customers_are_invisible_to_the_directory() {
        let store = Store::new();
        let customer = store.insert_customer(CustomerAccount::new("cid", "h".to_string(), Utc::now())).unwrap();
        assert_eq!(store.find_account_by_id(customer.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn directory_reflects_live_account_state() {
        let store = Store::new();
        let account = store.insert_account(admin("amy", Role::Owner)).unwrap();

        let record = store.find_account_by_id(account.id).await.unwrap().unwrap();
        assert!(!record.enabled);

        store
            .update_account(account.id, |a| {
                a.enabled = true;
                a.role = Role::Support;
            })
            .unwrap();
        let record = store.find_account_by_id(account.id).await.unwrap().unwrap();
        assert!(record.enabled);
        assert_eq!(record.role, Role::Support);

        assert_eq!(store.find_account_by_id(AccountId::new()).await.unwrap(), None);
    }
}
