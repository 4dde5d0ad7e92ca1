//! Behaviour-driven scenarios for sharing a list and curating its places.
//!
//! Each scenario runs against its own database cloned from the migrated
//! template on the shared embedded cluster. When the cluster cannot start the
//! steps become no-ops and the scenario is reported as skipped.

use std::future::Future;
use std::sync::Arc;

use pg_embedded_setup_unpriv::TemporaryDatabase;
use placelists::domain::ports::{IdentityCommand, ListCommand, PlaceCommand};
use placelists::domain::{
    Email, Error, ErrorCode, IdentityResolver, ListId, ListName, ListService, NewList,
    NewPlace, NewPlaceInput, Patch, Place, PlaceService, PlaceUpdate, UserId,
    VerifiedIdentity,
};
use placelists::outbound::persistence::{
    DbPool, DieselIdentityStore, DieselListRepository, DieselPlaceRepository,
    DieselUserRepository, PoolConfig,
};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use tokio::runtime::Runtime;

mod support;

use support::{handle_cluster_setup_failure, provision_template_database, shared_cluster};

const OWNER_EMAIL: &str = "owner@example.com";
const NOTES: &str = "ask for the sardines";

// -----------------------------------------------------------------------------
// Test World
// -----------------------------------------------------------------------------

/// Services wired to one temporary database.
struct Scene {
    runtime: Runtime,
    identity: IdentityResolver<DieselIdentityStore>,
    lists: ListService<DieselListRepository, DieselUserRepository>,
    places: PlaceService<DieselPlaceRepository, DieselListRepository>,
    _database: TemporaryDatabase,
}

impl Scene {
    fn start() -> Result<Self, String> {
        let runtime = Runtime::new().map_err(|err| err.to_string())?;
        let cluster = shared_cluster().map_err(|err| format!("{err:?}"))?;
        let database = provision_template_database(cluster)?;

        let config = PoolConfig::new(database.url().to_string())
            .with_max_size(2)
            .with_min_idle(Some(1));
        let pool = runtime
            .block_on(DbPool::new(config))
            .map_err(|err| err.to_string())?;

        let users = Arc::new(DieselUserRepository::new(pool.clone()));
        let lists = Arc::new(DieselListRepository::new(pool.clone()));

        Ok(Self {
            identity: IdentityResolver::new(Arc::new(DieselIdentityStore::new(pool.clone()))),
            lists: ListService::new(Arc::clone(&lists), users),
            places: PlaceService::new(Arc::new(DieselPlaceRepository::new(pool)), lists),
            runtime,
            _database: database,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn sign_in(&self, email: &str) -> UserId {
        let identity = VerifiedIdentity {
            uid: Some(format!("uid-{email}")),
            email: Some(email.to_owned()),
            name: None,
            picture: None,
        };
        self.block_on(self.identity.resolve_or_create(identity))
            .expect("identity resolves")
            .user_id
    }
}

/// Outcome of the last command, reduced to its error code.
type Outcome = Result<(), ErrorCode>;

#[derive(Default, ScenarioState)]
struct LifecycleWorld {
    scene: Slot<Arc<Scene>>,
    setup_error: Slot<String>,
    owner: Slot<UserId>,
    list: Slot<ListId>,
    collaborator: Slot<UserId>,
    signed_in: Slot<UserId>,
    saved: Slot<Place>,
    before_update: Slot<Place>,
    outcome: Slot<Outcome>,
}

impl LifecycleWorld {
    fn is_skipped(&self) -> bool {
        self.setup_error.get().is_some()
    }

    /// Run `step` against the scene, or do nothing when setup was skipped.
    fn run<T>(&self, step: impl FnOnce(&Scene) -> T) -> Option<T> {
        if self.is_skipped() {
            return None;
        }
        let scene = self.scene.get().expect("scene started");
        Some(step(&scene))
    }

    fn owner(&self) -> UserId {
        self.owner.get().expect("owner signed in")
    }

    fn list(&self) -> ListId {
        self.list.get().expect("list created")
    }

    fn collaborator(&self) -> UserId {
        self.collaborator.get().expect("collaborator invited")
    }

    fn saved(&self) -> Place {
        self.saved.get().expect("place saved")
    }

    fn record<T>(&self, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => {
                self.outcome.set(Ok(()));
                Some(value)
            }
            Err(error) => {
                self.outcome.set(Err(error.code()));
                None
            }
        }
    }

    fn outcome(&self) -> Outcome {
        self.outcome.get().expect("a command ran")
    }
}

#[fixture]
fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

fn place(external_ref: &str) -> NewPlace {
    NewPlace::new(NewPlaceInput {
        external_ref: external_ref.to_owned(),
        name: "Tasca do Chico".to_owned(),
        address: "Rua do Diário de Notícias 39, Lisboa".to_owned(),
        latitude: 38.7114,
        longitude: -9.1446,
        rating: Some("MUST_VISIT".to_owned()),
        notes: None,
        visit_status: None,
    })
    .expect("valid place")
}

fn code_name(code: ErrorCode) -> String {
    serde_json::to_value(code)
        .ok()
        .and_then(|value| value.as_str().map(str::to_owned))
        .expect("error codes serialise as strings")
}

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("an owner with a {visibility} list")]
fn an_owner_with_a_list(world: &LifecycleWorld, visibility: String) {
    let scene = match Scene::start() {
        Ok(scene) => Arc::new(scene),
        Err(reason) => {
            let _: Option<()> = handle_cluster_setup_failure(reason.clone());
            world.setup_error.set(reason);
            return;
        }
    };

    let owner = scene.sign_in(OWNER_EMAIL);
    let list = NewList {
        owner_id: owner,
        name: ListName::new("Lisbon").expect("valid name"),
        description: None,
        is_private: visibility == "private",
    };
    let details = scene
        .block_on(scene.lists.create_list(list))
        .expect("list created");

    world.owner.set(owner);
    world.list.set(details.id);
    world.scene.set(scene);
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("the owner invites {email}")]
fn the_owner_invites(world: &LifecycleWorld, email: String) {
    let Some(result) = world.run(|scene| {
        let email = Email::new(&email).expect("valid email");
        scene.block_on(scene.lists.add_collaborator(world.list(), world.owner(), email))
    }) else {
        return;
    };
    if let Some(user) = world.record(result) {
        world.collaborator.set(user);
    }
}

#[when("{email} signs in")]
fn someone_signs_in(world: &LifecycleWorld, email: String) {
    if let Some(user) = world.run(|scene| scene.sign_in(&email)) {
        world.signed_in.set(user);
    }
}

#[when("the owner removes the collaborator")]
fn the_owner_removes_the_collaborator(world: &LifecycleWorld) {
    if let Some(result) = world.run(|scene| {
        scene.block_on(scene.lists.remove_collaborator(
            world.list(),
            world.owner(),
            world.collaborator(),
        ))
    }) {
        world.record(result);
    }
}

#[when("the owner removes themselves")]
fn the_owner_removes_themselves(world: &LifecycleWorld) {
    if let Some(result) = world.run(|scene| {
        scene.block_on(scene.lists.remove_collaborator(
            world.list(),
            world.owner(),
            world.owner(),
        ))
    }) {
        world.record(result);
    }
}

#[when("the owner saves place {external_ref}")]
fn the_owner_saves_place(world: &LifecycleWorld, external_ref: String) {
    let Some(result) = world.run(|scene| {
        scene.block_on(
            scene
                .places
                .add_place(world.list(), world.owner(), place(&external_ref)),
        )
    }) else {
        return;
    };
    if let Some(saved) = world.record(result) {
        world.saved.set(saved);
    }
}

fn update_saved_place(world: &LifecycleWorld, update: PlaceUpdate) {
    let Some(result) = world.run(|scene| {
        scene.block_on(scene.places.update_place(
            world.list(),
            world.saved().id,
            world.owner(),
            update,
        ))
    }) else {
        return;
    };
    if let Some(updated) = world.record(result) {
        world.saved.set(updated);
    }
}

#[when("the owner adds notes to the saved place")]
fn the_owner_adds_notes(world: &LifecycleWorld) {
    update_saved_place(
        world,
        PlaceUpdate {
            notes: Patch::Value(NOTES.to_owned()),
            ..PlaceUpdate::default()
        },
    );
}

#[when("the owner sends an empty place update")]
fn the_owner_sends_an_empty_update(world: &LifecycleWorld) {
    if world.is_skipped() {
        return;
    }
    world.before_update.set(world.saved());
    update_saved_place(world, PlaceUpdate::default());
}

#[when("the owner rates the saved place {rating}")]
fn the_owner_rates_the_saved_place(world: &LifecycleWorld, rating: String) {
    update_saved_place(
        world,
        PlaceUpdate {
            rating: Patch::Value(rating),
            ..PlaceUpdate::default()
        },
    );
}

#[when("the owner deletes the saved place")]
fn the_owner_deletes_the_saved_place(world: &LifecycleWorld) {
    if let Some(result) = world.run(|scene| {
        scene.block_on(
            scene
                .places
                .delete_place(world.list(), world.saved().id, world.owner()),
        )
    }) {
        world.record(result);
    }
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("the request succeeds")]
fn the_request_succeeds(world: &LifecycleWorld) {
    if world.is_skipped() {
        eprintln!("SKIP-TEST-CLUSTER: scenario skipped");
        return;
    }
    assert_eq!(world.outcome(), Ok(()));
}

#[then("the request fails with {code}")]
fn the_request_fails_with(world: &LifecycleWorld, code: String) {
    if world.is_skipped() {
        eprintln!("SKIP-TEST-CLUSTER: scenario skipped");
        return;
    }
    match world.outcome() {
        Ok(()) => panic!("expected {code}, but the request succeeded"),
        Err(actual) => assert_eq!(code_name(actual), code),
    }
}

#[then("the invited account is reused")]
fn the_invited_account_is_reused(world: &LifecycleWorld) {
    if world.is_skipped() {
        return;
    }
    assert_eq!(world.signed_in.get(), Some(world.collaborator()));
}

#[then("the collaborator can open the list")]
fn the_collaborator_can_open_the_list(world: &LifecycleWorld) {
    let Some(result) = world.run(|scene| {
        scene.block_on(scene.lists.get_list(world.list(), world.collaborator()))
    }) else {
        return;
    };
    let details = result.expect("collaborator has access");
    assert!(!details.is_owner);
    assert_eq!(details.collaborators, vec!["bob@example.com".to_owned()]);
}

#[then("the collaborator can no longer open the list")]
fn the_collaborator_can_no_longer_open_the_list(world: &LifecycleWorld) {
    let Some(result) = world.run(|scene| {
        scene.block_on(scene.lists.get_list(world.list(), world.collaborator()))
    }) else {
        return;
    };
    let error = result.expect_err("access revoked");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[then("the saved place keeps its rating alongside the notes")]
fn the_saved_place_keeps_its_rating(world: &LifecycleWorld) {
    if world.is_skipped() {
        return;
    }
    let saved = world.saved();
    assert_eq!(saved.notes.as_deref(), Some(NOTES));
    assert_eq!(saved.rating.as_deref(), Some("MUST_VISIT"));
}

#[then("the saved place is unchanged")]
fn the_saved_place_is_unchanged(world: &LifecycleWorld) {
    if world.is_skipped() {
        return;
    }
    assert_eq!(world.outcome(), Ok(()));
    assert_eq!(Some(world.saved()), world.before_update.get());
}

// -----------------------------------------------------------------------------
// Scenario Bindings
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/list_lifecycles.feature",
    name = "Collaborator is invited, signs in and is removed"
)]
fn collaborator_lifecycle(world: LifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/list_lifecycles.feature",
    name = "Place is saved, edited and deleted"
)]
fn place_lifecycle(world: LifecycleWorld) {
    let _ = world;
}
