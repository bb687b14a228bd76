use super::{validate, OperationStore, StoreError};
use crate::model::{MockApi, MockApiDefinition, Operation};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::info;
use uuid::Uuid;

#[derive(Default)]
struct State {
    /// Insertion order is resolution order
    apis: Vec<MockApi>,
    /// Operation id -> owning API id
    operation_index: HashMap<String, String>,
}

impl State {
    fn position(&self, id: &str) -> Option<usize> {
        self.apis.iter().position(|api| api.id == id)
    }

    fn index(&mut self, api: &MockApi) {
        for op in &api.operations {
            self.operation_index.insert(op.id.clone(), api.id.clone());
        }
    }

    fn unindex(&mut self, api: &MockApi) {
        for op in &api.operations {
            self.operation_index.remove(&op.id);
        }
    }
}

/// In-memory mock API store.
///
/// Every write validates the definition and recompiles the matchers of all
/// its operations before swapping it in under the write lock.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new mock API and return it with its generated identifiers.
    ///
    /// Operation ids supplied by the client are ignored.
    pub fn create(&self, definition: MockApiDefinition) -> Result<MockApi, StoreError> {
        validate(&definition)?;
        let api = build_api(new_id(), definition, &HashSet::new())?;

        let mut state = self.state.write();
        state.index(&api);
        state.apis.push(api.clone());
        drop(state);

        info!(
            api_id = %api.id,
            name = %api.name,
            operations = api.operations.len(),
            "Created mock API"
        );
        Ok(api)
    }

    /// Replace an existing mock API, keeping its position.
    ///
    /// Supplied operation ids survive only if they already belonged to this
    /// API; every other operation gets a fresh id.
    pub fn update(&self, id: &str, definition: MockApiDefinition) -> Result<MockApi, StoreError> {
        validate(&definition)?;

        let mut state = self.state.write();
        let pos = state
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let known: HashSet<String> = state.apis[pos]
            .operations
            .iter()
            .map(|op| op.id.clone())
            .collect();
        let api = build_api(id.to_string(), definition, &known)?;

        let old = std::mem::replace(&mut state.apis[pos], api.clone());
        state.unindex(&old);
        state.index(&api);
        drop(state);

        info!(
            api_id = %api.id,
            name = %api.name,
            operations = api.operations.len(),
            "Updated mock API"
        );
        Ok(api)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let pos = state
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let api = state.apis.remove(pos);
        state.unindex(&api);
        drop(state);

        info!(api_id = %id, name = %api.name, "Deleted mock API");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<MockApi, StoreError> {
        let state = self.state.read();
        state
            .position(id)
            .map(|pos| state.apis[pos].clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn list(&self) -> Vec<MockApi> {
        self.state.read().apis.clone()
    }
}

impl OperationStore for InMemoryStore {
    fn find_all_operations(&self) -> Vec<Operation> {
        let state = self.state.read();
        state
            .apis
            .iter()
            .flat_map(|api| api.operations.iter().cloned())
            .collect()
    }

    fn find_operation_by_id(&self, id: &str) -> Option<Operation> {
        let state = self.state.read();
        let api_id = state.operation_index.get(id)?;
        let pos = state.position(api_id)?;
        state.apis[pos]
            .operations
            .iter()
            .find(|op| op.id == id)
            .cloned()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn build_api(
    id: String,
    definition: MockApiDefinition,
    known_operation_ids: &HashSet<String>,
) -> Result<MockApi, StoreError> {
    let MockApiDefinition {
        name,
        base_path,
        operations,
    } = definition;

    let mut taken = HashSet::new();
    let operations = operations
        .into_iter()
        .map(|mut op| {
            let op_id = op
                .id
                .take()
                .filter(|candidate| {
                    known_operation_ids.contains(candidate) && taken.insert(candidate.clone())
                })
                .unwrap_or_else(new_id);
            Operation::build(op_id, &base_path, op)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MockApi {
        id,
        name,
        base_path,
        operations,
    })
}
