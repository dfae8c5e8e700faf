use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, warn};

use super::{LeaveStore, LeaveTransaction, StoreError, Transactor};
use crate::leave::domain::{
    BalanceKey, CategoryId, EmployeeId, LeaveBalance, LeaveCategory, LeaveRequest,
    LeaveRequestId, RequestFilter,
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DocumentKey {
    Request(LeaveRequestId),
    Balance(BalanceKey),
}

#[derive(Debug, Clone)]
struct Versioned<T> {
    version: u64,
    document: T,
}

#[derive(Debug, Default)]
struct Documents {
    categories: BTreeMap<CategoryId, LeaveCategory>,
    requests: HashMap<LeaveRequestId, Versioned<LeaveRequest>>,
    balances: HashMap<BalanceKey, Versioned<LeaveBalance>>,
}

impl Documents {
    /// Zero stands for "absent", so creating a document also counts as a change.
    fn version(&self, key: &DocumentKey) -> u64 {
        match key {
            DocumentKey::Request(id) => self.requests.get(id).map_or(0, |doc| doc.version),
            DocumentKey::Balance(key) => self.balances.get(key).map_or(0, |doc| doc.version),
        }
    }

    fn is_stale(&self, observed: &HashMap<DocumentKey, u64>) -> bool {
        observed
            .iter()
            .any(|(key, version)| self.version(key) != *version)
    }

    fn write_request(&mut self, request: LeaveRequest) {
        let version = self.version(&DocumentKey::Request(request.id.clone())) + 1;
        self.requests.insert(
            request.id.clone(),
            Versioned {
                version,
                document: request,
            },
        );
    }

    fn write_balance(&mut self, balance: LeaveBalance) {
        let key = balance.key();
        let version = self.version(&DocumentKey::Balance(key.clone())) + 1;
        self.balances.insert(
            key,
            Versioned {
                version,
                document: balance,
            },
        );
    }
}

/// Document store held in process memory with optimistic concurrency control.
///
/// Every document carries a version. A transaction records the version of each document
/// it reads and buffers its writes; commit succeeds only if none of those versions moved,
/// otherwise the body is re-run against fresh data, up to `max_attempts` times.
#[derive(Debug)]
pub struct InMemoryLeaveStore {
    documents: Mutex<Documents>,
    revision: watch::Sender<u64>,
    max_attempts: u32,
}

impl Default for InMemoryLeaveStore {
    fn default() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }
}

impl InMemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(max_attempts: u32) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            documents: Mutex::new(Documents::default()),
            revision,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn lock(&self) -> Result<MutexGuard<'_, Documents>, StoreError> {
        lock_documents(&self.documents)
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn commit(&self, tx: MemoryTransaction<'_>) -> Result<bool, StoreError> {
        let mut documents = self.lock()?;
        if documents.is_stale(&tx.observed) {
            return Ok(false);
        }
        if tx.requests.is_empty() && tx.balances.is_empty() {
            return Ok(true);
        }

        for request in tx.requests.into_values() {
            documents.write_request(request);
        }
        for balance in tx.balances.into_values() {
            documents.write_balance(balance);
        }
        self.bump_revision();
        Ok(true)
    }
}

fn lock_documents(documents: &Mutex<Documents>) -> Result<MutexGuard<'_, Documents>, StoreError> {
    documents
        .lock()
        .map_err(|_| StoreError::Unavailable("document store lock poisoned".to_string()))
}

struct MemoryTransaction<'a> {
    documents: &'a Mutex<Documents>,
    observed: HashMap<DocumentKey, u64>,
    requests: HashMap<LeaveRequestId, LeaveRequest>,
    balances: HashMap<BalanceKey, LeaveBalance>,
}

impl<'a> MemoryTransaction<'a> {
    fn new(documents: &'a Mutex<Documents>) -> Self {
        Self {
            documents,
            observed: HashMap::new(),
            requests: HashMap::new(),
            balances: HashMap::new(),
        }
    }

    fn is_stale(&self) -> Result<bool, StoreError> {
        Ok(lock_documents(self.documents)?.is_stale(&self.observed))
    }

    /// Blind writes join the read-set too. A poisoned lock is left for commit to report.
    fn observe_write(&mut self, key: DocumentKey) {
        if self.observed.contains_key(&key) {
            return;
        }
        if let Ok(documents) = lock_documents(self.documents) {
            let current = documents.version(&key);
            self.observed.insert(key, current);
        }
    }
}

impl LeaveTransaction for MemoryTransaction<'_> {
    fn request(&mut self, id: &LeaveRequestId) -> Result<Option<LeaveRequest>, StoreError> {
        if let Some(pending) = self.requests.get(id) {
            return Ok(Some(pending.clone()));
        }

        let documents = lock_documents(self.documents)?;
        let key = DocumentKey::Request(id.clone());
        let current = documents.version(&key);
        self.observed.entry(key).or_insert(current);
        Ok(documents.requests.get(id).map(|doc| doc.document.clone()))
    }

    fn put_request(&mut self, request: LeaveRequest) {
        self.observe_write(DocumentKey::Request(request.id.clone()));
        self.requests.insert(request.id.clone(), request);
    }

    fn balance(&mut self, key: &BalanceKey) -> Result<Option<LeaveBalance>, StoreError> {
        if let Some(pending) = self.balances.get(key) {
            return Ok(Some(pending.clone()));
        }

        let documents = lock_documents(self.documents)?;
        let doc_key = DocumentKey::Balance(key.clone());
        let current = documents.version(&doc_key);
        self.observed.entry(doc_key).or_insert(current);
        Ok(documents.balances.get(key).map(|doc| doc.document.clone()))
    }

    fn put_balance(&mut self, balance: LeaveBalance) {
        let key = balance.key();
        self.observe_write(DocumentKey::Balance(key.clone()));
        self.balances.insert(key, balance);
    }
}

impl Transactor for InMemoryLeaveStore {
    fn run_in_transaction<T, E, F>(&self, mut body: F) -> Result<T, E>
    where
        F: FnMut(&mut dyn LeaveTransaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        for attempt in 1..=self.max_attempts {
            let mut tx = MemoryTransaction::new(&self.documents);
            match body(&mut tx) {
                Ok(value) => {
                    if self.commit(tx)? {
                        return Ok(value);
                    }
                }
                // An abort decided on data that has since moved is retried, not reported.
                Err(err) => match tx.is_stale() {
                    Ok(true) => {}
                    Ok(false) => return Err(err),
                    Err(check) => {
                        warn!(error = %check, "staleness check failed; keeping the abort");
                        return Err(err);
                    }
                },
            }
            debug!(attempt, "transaction read-set changed; retrying");
        }

        warn!(
            attempts = self.max_attempts,
            "transaction retry budget exhausted"
        );
        Err(StoreError::TransactionConflict {
            attempts: self.max_attempts,
        }
        .into())
    }
}

impl LeaveStore for InMemoryLeaveStore {
    fn insert_request(&self, request: LeaveRequest) -> Result<LeaveRequest, StoreError> {
        let mut documents = self.lock()?;
        if documents.requests.contains_key(&request.id) {
            return Err(StoreError::Conflict(request.id.0.clone()));
        }
        documents.write_request(request.clone());
        self.bump_revision();
        Ok(request)
    }

    fn fetch_request(&self, id: &LeaveRequestId) -> Result<Option<LeaveRequest>, StoreError> {
        let documents = self.lock()?;
        Ok(documents.requests.get(id).map(|doc| doc.document.clone()))
    }

    fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        let documents = self.lock()?;
        let mut requests: Vec<LeaveRequest> = documents
            .requests
            .values()
            .map(|doc| &doc.document)
            .filter(|request| filter.matches(request))
            .cloned()
            .collect();
        requests.sort_by(|a, b| {
            b.requested_at
                .cmp(&a.requested_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(requests)
    }

    fn fetch_balance(&self, key: &BalanceKey) -> Result<Option<LeaveBalance>, StoreError> {
        let documents = self.lock()?;
        Ok(documents.balances.get(key).map(|doc| doc.document.clone()))
    }

    fn list_balances(
        &self,
        employee_id: Option<&EmployeeId>,
    ) -> Result<Vec<LeaveBalance>, StoreError> {
        let documents = self.lock()?;
        let mut balances: Vec<LeaveBalance> = documents
            .balances
            .values()
            .map(|doc| &doc.document)
            .filter(|balance| employee_id.map_or(true, |id| &balance.employee_id == id))
            .cloned()
            .collect();
        balances.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(balances)
    }

    fn insert_category(&self, category: LeaveCategory) -> Result<LeaveCategory, StoreError> {
        let mut documents = self.lock()?;
        if documents.categories.contains_key(&category.id) {
            return Err(StoreError::Conflict(category.id.0.clone()));
        }
        documents
            .categories
            .insert(category.id.clone(), category.clone());
        self.bump_revision();
        Ok(category)
    }

    fn update_category(&self, category: LeaveCategory) -> Result<LeaveCategory, StoreError> {
        let mut documents = self.lock()?;
        match documents.categories.get_mut(&category.id) {
            Some(existing) => {
                *existing = category.clone();
                self.bump_revision();
                Ok(category)
            }
            None => Err(StoreError::NotFound(category.id.0.clone())),
        }
    }

    fn fetch_category(&self, id: &CategoryId) -> Result<Option<LeaveCategory>, StoreError> {
        let documents = self.lock()?;
        Ok(documents.categories.get(id).cloned())
    }

    fn list_categories(&self) -> Result<Vec<LeaveCategory>, StoreError> {
        let documents = self.lock()?;
        let mut categories: Vec<LeaveCategory> = documents.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    fn delete_category(&self, id: &CategoryId) -> Result<(), StoreError> {
        let mut documents = self.lock()?;
        if documents.categories.remove(id).is_none() {
            return Err(StoreError::NotFound(id.0.clone()));
        }
        self.bump_revision();
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
