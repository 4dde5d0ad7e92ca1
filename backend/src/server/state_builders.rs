//! Wire Diesel adapters into domain services and collect them as HTTP state.

use std::sync::Arc;

use actix_web::web;

use placelists::domain::{
    AccountService, IdentityResolver, ListService, PlaceService, SocialService,
};
use placelists::inbound::http::state::HttpState;
use placelists::outbound::persistence::{
    DbPool, DieselIdentityStore, DieselListRepository, DieselPlaceRepository,
    DieselSocialRepository, DieselUserRepository,
};

/// Build every driving port over one shared pool.
///
/// Repositories are shared between the services that read them, so a list
/// repository backs both list management and place access checks.
pub(super) fn build_http_state(pool: &DbPool) -> web::Data<HttpState> {
    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let lists = Arc::new(DieselListRepository::new(pool.clone()));
    let places = Arc::new(DieselPlaceRepository::new(pool.clone()));
    let social = Arc::new(DieselSocialRepository::new(pool.clone()));
    let identities = Arc::new(DieselIdentityStore::new(pool.clone()));

    web::Data::new(HttpState {
        identity: Arc::new(IdentityResolver::new(identities)),
        accounts: Arc::new(AccountService::new(Arc::clone(&users))),
        lists: Arc::new(ListService::new(Arc::clone(&lists), Arc::clone(&users))),
        places: Arc::new(PlaceService::new(places, lists)),
        social: Arc::new(SocialService::new(social, users)),
    })
}
