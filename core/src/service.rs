//! Data service: CRUD against the remote collection, kept in step with a
//! `Store`.
//!
//! # Design
//! Every mutation is followed by a full refetch of the collection; the
//! store is never patched locally. Operations that touch the list borrow
//! the store mutably for the duration of the call, so the service itself
//! holds no UI state and can be shared by any front-end.
//!
//! Failures are logged where they happen and returned to the caller as
//! `ApiError`. Once a mutation has been attempted the list is refetched
//! whether or not it succeeded, since a failure often means the server
//! changed underneath us. The mutation's error is returned first; a refetch
//! error is returned only when the mutation itself succeeded.

use tracing::{debug, warn};

use crate::client::TodoClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::store::Store;
use crate::types::{Todo, TodoId};

#[derive(Debug, Clone)]
pub struct TodoService<T> {
    client: TodoClient,
    transport: T,
}

impl<T: Transport> TodoService<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn from_config(config: &ClientConfig, transport: T) -> Self {
        Self::new(TodoClient::new(&config.base_url), transport)
    }

    /// Refresh the store's list from the server. Leaves edit mode first.
    pub fn fetch_todos(&self, store: &mut Store) -> Result<(), ApiError> {
        if store.editing_id().is_some() {
            store.set_editing_id(None);
        }
        let ticket = store.begin_fetch();
        let list = self
            .send(self.client.build_list_todos())
            .and_then(|response| self.client.parse_list_todos(response))
            .inspect_err(|e| warn!(error = %e, "fetching todos failed"))?;
        debug!(count = list.len(), "fetched todos");
        store.apply_fetch(ticket, list);
        Ok(())
    }

    pub fn get_one(&self, id: TodoId) -> Result<Todo, ApiError> {
        self.send(self.client.build_get_todo(id))
            .and_then(|response| self.client.parse_get_todo(response))
            .inspect_err(|e| warn!(id, error = %e, "fetching todo failed"))
    }

    /// Create `todo` on the server and refetch. Any id on `todo` is ignored.
    pub fn add_todo(&self, todo: &Todo, store: &mut Store) -> Result<Todo, ApiError> {
        validate(todo)?;
        let outcome = self.create(todo);
        self.resync(outcome, store)
    }

    /// Replace the record with `todo.id`, or create it when there is no id.
    /// Leaves edit mode once the save has been attempted.
    pub fn update_todo(&self, todo: &Todo, store: &mut Store) -> Result<Todo, ApiError> {
        validate(todo)?;
        let outcome = match todo.id {
            Some(id) => self.replace(id, todo),
            None => self.create(todo),
        };
        if store.editing_id().is_some() {
            store.set_editing_id(None);
        }
        self.resync(outcome, store)
    }

    /// Read the record, flip its `completed` flag to the given value and
    /// write it back.
    pub fn set_status(
        &self,
        id: TodoId,
        completed: bool,
        store: &mut Store,
    ) -> Result<Todo, ApiError> {
        let outcome = self.get_one(id).and_then(|mut todo| {
            todo.completed = completed;
            self.replace(id, &todo)
        });
        self.resync(outcome, store)
    }

    pub fn delete_todo(&self, id: TodoId, store: &mut Store) -> Result<(), ApiError> {
        let outcome = self
            .send(self.client.build_delete_todo(id))
            .and_then(|response| self.client.parse_delete_todo(response))
            .inspect_err(|e| warn!(id, error = %e, "deleting todo failed"));
        self.resync(outcome, store)
    }

    /// Refetch after a mutation attempt whatever its outcome. The mutation's
    /// own error takes precedence over a refetch error.
    fn resync<R>(&self, outcome: Result<R, ApiError>, store: &mut Store) -> Result<R, ApiError> {
        let refreshed = self.fetch_todos(store);
        let value = outcome?;
        refreshed?;
        Ok(value)
    }

    fn create(&self, todo: &Todo) -> Result<Todo, ApiError> {
        self.client
            .build_create_todo(todo)
            .and_then(|request| self.send(request))
            .and_then(|response| self.client.parse_create_todo(response))
            .inspect_err(|e| warn!(error = %e, "creating todo failed"))
    }

    fn replace(&self, id: TodoId, todo: &Todo) -> Result<Todo, ApiError> {
        self.client
            .build_update_todo(id, todo)
            .and_then(|request| self.send(request))
            .and_then(|response| self.client.parse_update_todo(response))
            .inspect_err(|e| warn!(id, error = %e, "updating todo failed"))
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, path = %request.path, "sending request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }
}

fn validate(todo: &Todo) -> Result<(), ApiError> {
    todo.validate()
        .inspect_err(|e| debug!(error = %e, "todo rejected before sending"))
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;

    use super::*;
    use crate::http::{HttpMethod, TransportError};

    const BASE: &str = "http://todos.test";

    /// In-memory stand-in for the REST collection.
    #[derive(Default)]
    struct FakeServer {
        todos: RefCell<BTreeMap<TodoId, Todo>>,
        last_id: Cell<TodoId>,
        requests: RefCell<Vec<(HttpMethod, String)>>,
        offline: Cell<bool>,
        list_status: Cell<Option<u16>>,
    }

    impl FakeServer {
        fn seeded(todos: &[(&str, &str, bool)]) -> Self {
            let server = Self::default();
            for (title, description, completed) in todos {
                let mut todo = Todo::new(*title, *description);
                todo.completed = *completed;
                server.insert(todo);
            }
            server
        }

        fn insert(&self, mut todo: Todo) -> Todo {
            let id = self.last_id.get() + 1;
            self.last_id.set(id);
            todo.id = Some(id);
            self.todos.borrow_mut().insert(id, todo.clone());
            todo
        }

        fn request_log(&self) -> Vec<String> {
            self.requests
                .borrow()
                .iter()
                .map(|(m, p)| format!("{m} {}", p.trim_start_matches(BASE)))
                .collect()
        }

        fn json(status: u16, value: &impl serde::Serialize) -> HttpResponse {
            HttpResponse::new(status, serde_json::to_string(value).unwrap())
        }
    }

    impl Transport for FakeServer {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests
                .borrow_mut()
                .push((request.method, request.path.clone()));
            if self.offline.get() {
                return Err(TransportError::new(&request, "connection refused"));
            }
            let path = request.path.trim_start_matches(BASE);
            let id = path
                .strip_prefix("/todos/")
                .map(|raw| raw.parse::<TodoId>().unwrap());
            let missing = HttpResponse::new(404, r#"{"error":"Todo not found"}"#);

            let response = match (request.method, id) {
                (HttpMethod::Get, None) => match self.list_status.get() {
                    Some(status) => HttpResponse::new(status, "boom"),
                    None => {
                        let list: Vec<Todo> = self.todos.borrow().values().cloned().collect();
                        Self::json(200, &list)
                    }
                },
                (HttpMethod::Post, None) => {
                    let todo: Todo = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
                    assert!(todo.id.is_none(), "create body must not carry an id");
                    Self::json(200, &self.insert(todo))
                }
                (HttpMethod::Get, Some(id)) => match self.todos.borrow().get(&id) {
                    Some(todo) => Self::json(200, todo),
                    None => missing,
                },
                (HttpMethod::Put, Some(id)) => {
                    let mut todo: Todo =
                        serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
                    todo.id = Some(id);
                    let replaced = self.todos.borrow_mut().get_mut(&id).map(|slot| {
                        *slot = todo.clone();
                    });
                    match replaced {
                        Some(()) => Self::json(200, &todo),
                        None => missing,
                    }
                }
                (HttpMethod::Delete, Some(id)) => match self.todos.borrow_mut().remove(&id) {
                    Some(todo) => Self::json(200, &todo),
                    None => missing,
                },
                _ => HttpResponse::new(405, ""),
            };
            Ok(response)
        }
    }

    fn service(server: &FakeServer) -> TodoService<&FakeServer> {
        TodoService::new(TodoClient::new(BASE), server)
    }

    #[test]
    fn fetch_populates_store_and_leaves_edit_mode() {
        let server = FakeServer::seeded(&[("a", "x", false), ("b", "y", true)]);
        let mut store = Store::new();
        store.set_editing_id(Some(1));

        service(&server).fetch_todos(&mut store).unwrap();

        assert_eq!(store.list().len(), 2);
        assert_eq!(store.editing_id(), None);
    }

    #[test]
    fn fetch_failure_keeps_previous_list() {
        let server = FakeServer::seeded(&[("a", "x", false)]);
        let mut store = Store::new();
        let svc = service(&server);
        svc.fetch_todos(&mut store).unwrap();

        server.list_status.set(Some(500));
        let err = svc.fetch_todos(&mut store).unwrap_err();

        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn add_creates_one_record_with_server_id() {
        let server = FakeServer::seeded(&[("a", "x", false)]);
        let mut store = Store::new();
        let svc = service(&server);
        svc.fetch_todos(&mut store).unwrap();
        let before = store.list().len();

        let created = svc.add_todo(&Todo::new("A", "B"), &mut store).unwrap();

        assert_eq!(created.id, Some(2));
        assert_eq!(store.list().len(), before + 1);
        assert!(store.list().iter().any(|t| t.id == Some(2) && t.title == "A"));
        assert_eq!(
            server.request_log(),
            vec!["GET /todos", "POST /todos", "GET /todos"]
        );
    }

    #[test]
    fn update_with_id_replaces_in_place() {
        let server = FakeServer::seeded(&[("a", "x", false)]);
        let mut store = Store::new();
        store.set_editing_id(Some(1));

        let edited = Todo {
            id: Some(1),
            title: "renamed".to_string(),
            description: "changed".to_string(),
            completed: true,
        };
        service(&server).update_todo(&edited, &mut store).unwrap();

        assert_eq!(store.list(), &[edited]);
        assert_eq!(store.editing_id(), None);
        assert_eq!(server.request_log(), vec!["PUT /todos/1", "GET /todos"]);
    }

    #[test]
    fn update_without_id_behaves_like_add() {
        let server = FakeServer::default();
        let mut store = Store::new();

        let saved = service(&server)
            .update_todo(&Todo::new("A", "B"), &mut store)
            .unwrap();

        assert_eq!(saved.id, Some(1));
        assert_eq!(store.list().len(), 1);
        assert_eq!(server.request_log(), vec!["POST /todos", "GET /todos"]);
    }

    #[test]
    fn set_status_reads_then_writes() {
        let server = FakeServer::seeded(&[("a", "x", false)]);
        let mut store = Store::new();

        let saved = service(&server).set_status(1, true, &mut store).unwrap();

        assert!(saved.completed);
        assert_eq!(saved.title, "a");
        assert!(store.list()[0].completed);
        assert_eq!(
            server.request_log(),
            vec!["GET /todos/1", "PUT /todos/1", "GET /todos"]
        );
    }

    #[test]
    fn set_status_on_missing_record_is_not_found() {
        let server = FakeServer::default();
        let mut store = Store::new();

        let err = service(&server).set_status(3, true, &mut store).unwrap_err();

        assert!(matches!(err, ApiError::NotFound));
        assert_eq!(server.request_log(), vec!["GET /todos/3", "GET /todos"]);
    }

    #[test]
    fn delete_removes_record_from_list() {
        let server = FakeServer::seeded(&[("a", "x", false), ("b", "y", false)]);
        let mut store = Store::new();
        let svc = service(&server);

        svc.delete_todo(1, &mut store).unwrap();

        assert!(store.list().iter().all(|t| t.id != Some(1)));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn failed_mutations_still_resync_the_store() {
        let server = FakeServer::seeded(&[("a", "x", false)]);
        let mut store = Store::new();
        let svc = service(&server);
        svc.fetch_todos(&mut store).unwrap();

        // Another client removes #1 and adds #2 behind our back.
        server.todos.borrow_mut().remove(&1);
        server.insert(Todo::new("b", "y"));

        let err = svc.delete_todo(1, &mut store).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
        let ids: Vec<_> = store.list().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![Some(2)]);

        server.todos.borrow_mut().remove(&2);
        store.set_editing_id(Some(2));
        let stale = Todo {
            id: Some(2),
            ..Todo::new("b", "changed")
        };
        let err = svc.update_todo(&stale, &mut store).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
        assert!(store.list().is_empty());
        assert_eq!(store.editing_id(), None);

        assert_eq!(
            server.request_log(),
            vec![
                "GET /todos",
                "DELETE /todos/1",
                "GET /todos",
                "PUT /todos/2",
                "GET /todos",
            ]
        );
    }

    #[test]
    fn mutation_error_wins_over_refetch_error() {
        let server = FakeServer::default();
        server.list_status.set(Some(503));
        let mut store = Store::new();

        let err = service(&server).delete_todo(4, &mut store).unwrap_err();

        assert!(matches!(err, ApiError::NotFound));
        assert_eq!(server.request_log(), vec!["DELETE /todos/4", "GET /todos"]);
    }

    #[test]
    fn get_one_returns_typed_errors() {
        let server = FakeServer::seeded(&[("a", "x", false)]);
        let svc = service(&server);

        assert_eq!(svc.get_one(1).unwrap().title, "a");
        assert!(matches!(svc.get_one(2), Err(ApiError::NotFound)));

        server.offline.set(true);
        assert!(matches!(svc.get_one(1), Err(ApiError::Transport(_))));
    }

    #[test]
    fn invalid_record_sends_nothing() {
        let server = FakeServer::default();
        let mut store = Store::new();
        let svc = service(&server);

        let err = svc.add_todo(&Todo::new("", "B"), &mut store).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = svc
            .update_todo(
                &Todo {
                    id: Some(1),
                    ..Todo::new("A", "")
                },
                &mut store,
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        assert!(server.request_log().is_empty());
    }

    #[test]
    fn refetch_failure_after_mutation_is_reported() {
        let server = FakeServer::default();
        server.list_status.set(Some(503));
        let mut store = Store::new();

        let err = service(&server)
            .add_todo(&Todo::new("A", "B"), &mut store)
            .unwrap_err();

        assert!(matches!(err, ApiError::HttpError { status: 503, .. }));
        assert_eq!(server.todos.borrow().len(), 1);
        assert!(store.list().is_empty());
    }

    #[test]
    fn offline_mutation_is_a_transport_error() {
        let server = FakeServer::default();
        server.offline.set(true);
        let mut store = Store::new();

        let err = service(&server).delete_todo(1, &mut store).unwrap_err();

        // The resync also fails, but the delete's own error is reported.
        match err {
            ApiError::Transport(e) => {
                assert_eq!(e.method, HttpMethod::Delete);
                assert_eq!(e.message, "connection refused");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
