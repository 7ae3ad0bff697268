use chrono::Utc;
use hyper::{
    body,
    header::{CONTENT_TYPE, DATE},
    service::{make_service_fn, service_fn},
    Body, Method, Request, Response, Server,
};
use lazy_static::lazy_static;
use petstore_contract::data::{Order, Pet, User};
use serde_json::{json, Value};
use std::{
    collections::{BTreeMap, HashMap},
    convert::Infallible,
    net::{SocketAddr, TcpListener},
    sync::Mutex,
    thread,
};
use tokio::runtime::Runtime;
use tracing::debug;

lazy_static! {
    static ref STUB_ADDRESS: SocketAddr = start();
    static ref STORE: Mutex<PetStore> = Mutex::new(PetStore::seeded());
}

/// Base address of the in-process pet store, started on first use.
pub fn base_address() -> String {
    format!("http://{}/v2", *STUB_ADDRESS)
}

fn start() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let address = listener.local_addr().unwrap();

    thread::spawn(move || {
        Runtime::new().unwrap().block_on(async {
            let server = Server::from_tcp(listener)
                .unwrap()
                .serve(make_service_fn(|_| async {
                    Ok::<_, Infallible>(service_fn(handle_request))
                }));

            if let Err(e) = server.await {
                eprintln!("Pet store stub error: {}", e);
            }
        });
    });

    address
}

async fn handle_request(request: Request<Body>) -> Result<Response<Body>, Infallible> {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let query = request.uri().query().unwrap_or_default().to_owned();
    let body = body::to_bytes(request.into_body())
        .await
        .map(|bytes| bytes.to_vec())
        .unwrap_or_default();

    let segments: Vec<&str> = path
        .trim_start_matches("/v2")
        .trim_matches('/')
        .split('/')
        .collect();

    let (status, reply) = STORE
        .lock()
        .unwrap()
        .route(&method, &segments, &query, &body);

    debug!(%method, %path, status, "pet store stub");

    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(DATE, Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string())
        .body(Body::from(reply.to_string()))
        .unwrap())
}

fn envelope<M: Into<Value>>(code: i64, kind: &str, message: M) -> Value {
    json!({"code": code, "type": kind, "message": message.into()})
}

fn form_fields(text: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(text).into_owned().collect()
}

/// In-memory pet store holding just enough of the public service's behavior.
#[derive(Debug, Default)]
struct PetStore {
    orders: HashMap<i64, Order>,
    pets: BTreeMap<i64, Pet>,
    users: HashMap<String, User>,
}

impl PetStore {
    fn seeded() -> Self {
        let mut store = Self::default();
        for (id, name, status) in [(1, "doggie", "available"), (2, "kitty", "pending"), (3, "birdie", "sold")]
            .iter()
        {
            store.pets.insert(
                *id,
                Pet {
                    id: *id,
                    name: name.to_string(),
                    status: status.to_string(),
                    ..Pet::default()
                },
            );
        }
        store
    }

    fn route(&mut self, method: &Method, segments: &[&str], query: &str, body: &[u8]) -> (u16, Value) {
        match (method, segments) {
            (&Method::POST, ["store", "order"]) => match serde_json::from_slice::<Order>(body) {
                Ok(order) => {
                    self.orders.insert(order.id, order.clone());
                    (200, json!(order))
                }
                Err(_) => (400, envelope(400, "unknown", "bad input")),
            },
            (&Method::GET, ["store", "inventory"]) => {
                let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
                for pet in self.pets.values() {
                    *counts.entry(pet.status.as_str()).or_default() += 1;
                }
                (200, json!(counts))
            }
            (&Method::GET, ["store", "order", id]) => {
                match id.parse().ok().and_then(|id: i64| self.orders.get(&id)) {
                    Some(order) => (200, json!(order)),
                    None => (404, envelope(1, "error", "Order not found")),
                }
            }
            (&Method::DELETE, ["store", "order", id]) => {
                match id.parse().ok().and_then(|id: i64| self.orders.remove(&id)) {
                    Some(order) => (200, envelope(200, "unknown", order.id.to_string())),
                    None => (404, envelope(404, "unknown", "Order Not Found")),
                }
            }
            (&Method::POST, ["pet"]) | (&Method::PUT, ["pet"]) => {
                match serde_json::from_slice::<Pet>(body) {
                    Ok(pet) => {
                        self.pets.insert(pet.id, pet.clone());
                        (200, json!(pet))
                    }
                    Err(_) => (405, envelope(405, "unknown", "Invalid input")),
                }
            }
            (&Method::GET, ["pet", "findByStatus"]) => {
                let wanted: Vec<String> = url::form_urlencoded::parse(query.as_bytes())
                    .filter(|(name, _)| name == "status")
                    .map(|(_, value)| value.into_owned())
                    .collect();
                let found: Vec<&Pet> = self
                    .pets
                    .values()
                    .filter(|pet| wanted.contains(&pet.status))
                    .collect();
                (200, json!(found))
            }
            (&Method::GET, ["pet", id]) => {
                match id.parse().ok().and_then(|id: i64| self.pets.get(&id)) {
                    Some(pet) => (200, json!(pet)),
                    None => (404, envelope(1, "error", "Pet not found")),
                }
            }
            (&Method::POST, ["pet", id]) => {
                let fields = form_fields(body);
                match id.parse().ok().and_then(|id: i64| self.pets.get_mut(&id)) {
                    Some(pet) => {
                        if let Some(name) = fields.get("name") {
                            pet.name = name.clone();
                        }
                        if let Some(status) = fields.get("status") {
                            pet.status = status.clone();
                        }
                        (200, envelope(200, "unknown", pet.id.to_string()))
                    }
                    None => (404, envelope(404, "unknown", "not found")),
                }
            }
            (&Method::DELETE, ["pet", id]) => {
                match id.parse().ok().and_then(|id: i64| self.pets.remove(&id)) {
                    Some(pet) => (200, envelope(200, "unknown", pet.id.to_string())),
                    None => (404, envelope(404, "unknown", "Pet not found")),
                }
            }
            (&Method::POST, ["user", "createWithArray"]) | (&Method::POST, ["user", "createWithList"]) => {
                match serde_json::from_slice::<Vec<User>>(body) {
                    Ok(users) => {
                        for user in users {
                            self.users.insert(user.username.clone(), user);
                        }
                        (200, envelope(200, "unknown", "ok"))
                    }
                    Err(_) => (400, envelope(400, "unknown", "bad input")),
                }
            }
            (&Method::GET, ["user", "login"]) => (
                200,
                envelope(
                    200,
                    "unknown",
                    format!("logged in user session:{}", Utc::now().timestamp_millis()),
                ),
            ),
            (&Method::GET, ["user", "logout"]) => (200, envelope(200, "unknown", "ok")),
            (&Method::GET, ["user", username]) => match self.users.get(*username) {
                Some(user) => (200, json!(user)),
                None => (404, envelope(1, "error", "User not found")),
            },
            (&Method::PUT, ["user", username]) => match serde_json::from_slice::<User>(body) {
                Ok(user) => {
                    self.users.remove(*username);
                    let id = user.id;
                    self.users.insert(user.username.clone(), user);
                    (200, envelope(200, "unknown", id.to_string()))
                }
                Err(_) => (400, envelope(400, "unknown", "bad input")),
            },
            (&Method::DELETE, ["user", username]) => match self.users.remove(*username) {
                Some(user) => (200, envelope(200, "unknown", user.username)),
                None => (404, envelope(404, "unknown", "User not found")),
            },
            _ => (404, envelope(404, "unknown", "not found")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PetStore;
    use hyper::Method;
    use serde_json::json;

    #[test]
    fn test_inventory_counts_the_seeded_statuses() {
        let mut store = PetStore::seeded();

        let (status, body) = store.route(&Method::GET, &["store", "inventory"], "", b"");

        assert_eq!(status, 200);
        assert_eq!(body, json!({"available": 1, "pending": 1, "sold": 1}));
    }

    #[test]
    fn test_form_update_of_missing_pet_is_not_found() {
        let mut store = PetStore::seeded();

        let (status, body) = store.route(&Method::POST, &["pet", "575890"], "", b"name=Alexandra&status=sold");

        assert_eq!(status, 404);
        assert_eq!(body["code"], json!(404));
    }
}
