//! The pet-store contract, one constructor per scenario. Identifiers are the ones the public
//! service is usually exercised with, so scenarios touching the same resource family share an
//! isolation key.

use crate::{
    data::{Order, Pet, User},
    PetstoreSpecs,
};
use restassay::{Assertion, Error, Scenario, Step, Target};
use serde::Serialize;
use serde_json::{json, Value};

pub const ORDERS: &str = "orders";
pub const PETS: &str = "pets";
pub const USERS: &str = "users";

const ORDER_ID: i64 = 1986;
const PET_ID: i64 = 1234;
const MISSING_ORDER_ID: i64 = 6660;
const MISSING_PET_ID: i64 = 1999;
const MISSING_PET_FOR_UPDATE_ID: i64 = 575_890;
const PHOTO_URLS: [&str; 2] = [
    "https://images.app.goo.gl/ZHZJF3zehDZnN6hm7",
    "https://images.app.goo.gl/hp16oDjyCnemmURm8",
];

fn to_body<T: Serialize>(resource: &T) -> Result<Value, Error> {
    Ok(serde_json::to_value(resource)?)
}

/// Create an order, read it back, delete it.
pub fn order_lifecycle(specs: &PetstoreSpecs) -> Result<Scenario, Error> {
    let order = Order {
        id: ORDER_ID,
        pet_id: PET_ID,
        quantity: 1,
        ship_date: None,
        status: "placed".into(),
        complete: true,
    };

    Ok(Scenario::new("order lifecycle", specs.json().clone())
        .isolation_key(ORDERS)
        .with_value("sentOrder", to_body(&order)?)
        .step(
            Step::post("/store/order")
                .body(to_body(&order)?)
                .expect_status(200)
                .decode(Target::resource::<Order>())
                .assert(Assertion::equals_state("", "sentOrder"))
                .capture("orderId", "/id"),
        )
        .step(
            Step::get("/store/order/{orderId}")
                .path_param("orderId", "{{orderId}}")
                .expect_status(200)
                .decode(Target::resource::<Order>())
                .assert(Assertion::equals_state("", "sentOrder")),
        )
        .step(
            Step::delete("/store/order/{orderId}")
                .path_param("orderId", "{{orderId}}")
                .expect_status(200)
                .decode(Target::error_envelope())
                .assert(Assertion::equals("/type", "unknown"))
                .assert(Assertion::equals_state("/message", "orderId")),
        ))
}

pub fn delete_missing_order(specs: &PetstoreSpecs) -> Result<Scenario, Error> {
    Ok(Scenario::new("delete nonexistent order", specs.json().clone())
        .isolation_key(ORDERS)
        .with_value("orderId", MISSING_ORDER_ID)
        .step(
            Step::delete("/store/order/{orderId}")
                .path_param("orderId", "{{orderId}}")
                .expect_status(404)
                .decode(Target::error_envelope())
                .assert(Assertion::equals("/type", "unknown")),
        ))
}

/// The number of status categories is whatever the service holds right now, so it is given by the caller.
pub fn inventory(specs: &PetstoreSpecs, categories: usize) -> Result<Scenario, Error> {
    Ok(Scenario::new("store inventory", specs.json().clone()).step(
        Step::get("/store/inventory")
            .expect_status(200)
            .decode(Target::counts())
            .assert(Assertion::size(categories)),
    ))
}

/// Create a pet, change it through JSON and through a form, find it by status, delete it.
pub fn pet_lifecycle(specs: &PetstoreSpecs) -> Result<Scenario, Error> {
    let pet = |id: &str, status: &str| {
        json!({
            "id": id,
            "category": {"id": "11", "name": "newCategory"},
            "name": "Johnny",
            "photoUrls": PHOTO_URLS,
            "tags": [{"id": "9999", "name": "newTag"}],
            "status": status
        })
    };

    Ok(Scenario::new("pet lifecycle", specs.json().clone())
        .isolation_key(PETS)
        .step(
            Step::post("/pet")
                .body(pet(&PET_ID.to_string(), "pending"))
                .expect_status(200)
                .decode(Target::resource::<Pet>())
                .assert(Assertion::equals("/id", PET_ID))
                .assert(Assertion::equals("/name", "Johnny"))
                .assert(Assertion::equals("/status", "pending"))
                .assert(Assertion::equals("/tags/0/name", "newTag"))
                .assert(Assertion::equals("/category/id", 11))
                .assert(Assertion::equals("/category/name", "newCategory"))
                .assert(Assertion::equals("/photoUrls", json!(PHOTO_URLS)))
                .capture("petId", "/id"),
        )
        .step(
            Step::put("/pet")
                .body(pet("{{petId}}", "available"))
                .expect_status(200)
                .decode(Target::resource::<Pet>())
                .assert(Assertion::equals_state("/id", "petId"))
                .assert(Assertion::equals("/status", "available"))
                .assert(Assertion::equals("/category/name", "newCategory"))
                .capture("updatedPet", ""),
        )
        .step(
            Step::get("/pet/findByStatus")
                .query_param("status", "available")
                .expect_status(200)
                .decode(Target::list::<Pet>())
                .assert(Assertion::every("/status", "available")),
        )
        .step(
            Step::get("/pet/{petId}")
                .path_param("petId", "{{petId}}")
                .expect_status(200)
                .decode(Target::resource::<Pet>())
                .assert(Assertion::equals_state("", "updatedPet")),
        )
        .step(
            Step::post("/pet/{petId}")
                .with_spec(specs.form().clone())
                .path_param("petId", "{{petId}}")
                .query_param("name", "Alexandra")
                .query_param("status", "sold")
                .expect_status(200)
                .decode(Target::error_envelope())
                .assert(Assertion::equals("/code", 200))
                .assert(Assertion::equals("/type", "unknown"))
                .assert(Assertion::equals_state("/message", "petId")),
        )
        .step(
            Step::get("/pet/{petId}")
                .path_param("petId", "{{petId}}")
                .expect_status(200)
                .decode(Target::resource::<Pet>())
                .assert(Assertion::equals("/status", "sold"))
                .assert(Assertion::equals("/name", "Alexandra"))
                .assert(Assertion::equals("/category/name", "newCategory")),
        )
        .step(
            Step::delete("/pet/{petId}")
                .path_param("petId", "{{petId}}")
                .header("api_key", specs.api_key())
                .expect_status(200),
        ))
}

pub fn find_missing_pet(specs: &PetstoreSpecs) -> Result<Scenario, Error> {
    Ok(Scenario::new("find nonexistent pet", specs.json().clone())
        .isolation_key(PETS)
        .with_value("petId", MISSING_PET_ID)
        .step(
            Step::get("/pet/{petId}")
                .path_param("petId", "{{petId}}")
                .expect_status(404)
                .decode(Target::error_envelope())
                .assert(Assertion::equals("/message", "Pet not found")),
        ))
}

pub fn update_missing_pet(specs: &PetstoreSpecs) -> Result<Scenario, Error> {
    Ok(Scenario::new("update nonexistent pet", specs.form().clone())
        .isolation_key(PETS)
        .with_value("petId", MISSING_PET_FOR_UPDATE_ID)
        .step(
            Step::post("/pet/{petId}")
                .path_param("petId", "{{petId}}")
                .query_param("name", "Alexandra")
                .query_param("status", "sold")
                .expect_status(404)
                .decode(Target::error_envelope())
                .assert(Assertion::equals("/code", 404)),
        ))
}

fn sample_users() -> (User, User) {
    let first = User {
        id: 1,
        username: "restassay-jdoe".into(),
        first_name: "John".into(),
        last_name: "Doe".into(),
        email: "jdoe@example.com".into(),
        password: "jdoe-secret".into(),
        phone: "555-0100".into(),
        user_status: 1,
    };
    let second = User {
        id: 2,
        username: "restassay-asmith".into(),
        first_name: "Anna".into(),
        last_name: "Smith".into(),
        email: "asmith@example.com".into(),
        password: "asmith-secret".into(),
        phone: "555-0101".into(),
        user_status: 1,
    };
    (first, second)
}

/// Batch-create two users, read them, update one, log in and out, delete both.
pub fn user_lifecycle(specs: &PetstoreSpecs) -> Result<Scenario, Error> {
    let (first, second) = sample_users();
    let updated = User {
        email: "john.doe@example.com".into(),
        ..first.clone()
    };

    Ok(Scenario::new("user lifecycle", specs.json().clone())
        .isolation_key(USERS)
        .with_value("firstUser", first.username.as_str())
        .with_value("secondUser", second.username.as_str())
        .with_value("sentFirstUser", to_body(&first)?)
        .with_value("sentSecondUser", to_body(&second)?)
        .step(
            Step::post("/user/createWithArray")
                .body(to_body(&vec![first.clone(), second.clone()])?)
                .expect_status(200)
                .decode(Target::error_envelope())
                .assert(Assertion::equals("/message", "ok")),
        )
        .step(
            Step::get("/user/{username}")
                .path_param("username", "{{firstUser}}")
                .expect_status(200)
                .decode(Target::resource::<User>())
                .assert(Assertion::equals_state("", "sentFirstUser")),
        )
        .step(
            Step::get("/user/{username}")
                .path_param("username", "{{secondUser}}")
                .expect_status(200)
                .decode(Target::resource::<User>())
                .assert(Assertion::equals_state("", "sentSecondUser")),
        )
        .step(
            Step::put("/user/{username}")
                .path_param("username", "{{firstUser}}")
                .body(to_body(&updated)?)
                .expect_status(200)
                .decode(Target::error_envelope())
                .assert(Assertion::equals("/message", updated.id.to_string())),
        )
        .step(
            Step::get("/user/login")
                .query_param("username", "{{firstUser}}")
                .query_param("password", first.password.as_str())
                .expect_status(200)
                .decode(Target::error_envelope())
                .assert(Assertion::equals("/code", 200))
                .assert(Assertion::contains("/message", "logged in user session")),
        )
        .step(
            Step::get("/user/logout")
                .expect_status(200)
                .decode(Target::error_envelope())
                .assert(Assertion::equals("/message", "ok")),
        )
        .step(
            Step::delete("/user/{username}")
                .path_param("username", "{{firstUser}}")
                .expect_status(200),
        )
        .step(
            Step::delete("/user/{username}")
                .path_param("username", "{{secondUser}}")
                .expect_status(200),
        ))
}

pub fn find_missing_user(specs: &PetstoreSpecs) -> Result<Scenario, Error> {
    Ok(Scenario::new("find nonexistent user", specs.json().clone())
        .isolation_key(USERS)
        .with_value("username", "restassay-nobody")
        .step(
            Step::get("/user/{username}")
                .path_param("username", "{{username}}")
                .expect_status(404)
                .decode(Target::error_envelope())
                .assert(Assertion::equals("/message", "User not found"))
                .assert(Assertion::equals("/code", 1))
                .assert(Assertion::header_contains("date", "GMT")),
        ))
}

/// Every scenario above, the inventory expecting `categories` statuses.
pub fn all(specs: &PetstoreSpecs, categories: usize) -> Result<Vec<Scenario>, Error> {
    Ok(vec![
        order_lifecycle(specs)?,
        delete_missing_order(specs)?,
        inventory(specs, categories)?,
        pet_lifecycle(specs)?,
        find_missing_pet(specs)?,
        update_missing_pet(specs)?,
        user_lifecycle(specs)?,
        find_missing_user(specs)?,
    ])
}
