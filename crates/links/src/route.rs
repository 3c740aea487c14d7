//! Hash-route classification and the retrieval it triggers.

use std::fmt;
use std::sync::Arc;

use snipshare_files::{FetchRequest, FilesAction, FilesDispatch};
use snipshare_types::ContentId;
use tracing::{debug, info, warn};

use crate::codec::{decode_addresses, COMPRESSED_ADDRESSES_PARAM, LEGACY_ADDRESSES_PARAM};
use crate::location::Location;

const MANAGE_PREFIX: &str = "/manage";
const ADD_PREFIX: &str = "/add";

/// Screen selected by a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Add,
    Manage,
    Download,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Route::Add => "add",
            Route::Manage => "manage",
            Route::Download => "download",
        };
        f.write_str(name)
    }
}

/// Classify a location without side effects.
///
/// `/manage` always wins; the add form is the fallback for the root, `/add`
/// and anything without a valid content id.
pub fn classify(location: &Location<'_>) -> Route {
    match download_target(location) {
        Ok(_) => Route::Download,
        Err(route) => route,
    }
}

/// The content id to download, or the non-download route.
fn download_target(location: &Location<'_>) -> Result<ContentId, Route> {
    let path = location.path();
    if path.starts_with(MANAGE_PREFIX) {
        return Err(Route::Manage);
    }
    if path.starts_with(ADD_PREFIX) || location.is_root() {
        return Err(Route::Add);
    }
    location
        .token()
        .and_then(|token| ContentId::parse(token).ok())
        .ok_or(Route::Add)
}

/// Identity of a retrieval: same id and same address parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FetchKey {
    content_id: ContentId,
    compressed: Option<String>,
    legacy: Option<String>,
}

/// Re-evaluates the route on every location change and starts a retrieval
/// once per distinct download link.
pub struct RouteStateMachine {
    dispatch: Arc<dyn FilesDispatch>,
    last_fetch: Option<FetchKey>,
}

impl RouteStateMachine {
    pub fn new(dispatch: Arc<dyn FilesDispatch>) -> Self {
        Self {
            dispatch,
            last_fetch: None,
        }
    }

    /// Observe a location (URL, fragment or bare route).
    ///
    /// Entering download mode dispatches `ResetFiles` then `FetchStart`.
    /// Observing the same link again does nothing; leaving download mode
    /// forgets the link so returning to it fetches again.
    pub fn observe(&mut self, location: &str) -> Route {
        let location = Location::parse(location);
        let content_id = match download_target(&location) {
            Ok(content_id) => content_id,
            Err(route) => {
                if self.last_fetch.take().is_some() {
                    debug!(%route, "left download route");
                }
                return route;
            }
        };

        let key = FetchKey {
            content_id,
            compressed: location.param(COMPRESSED_ADDRESSES_PARAM).map(str::to_string),
            legacy: location.param(LEGACY_ADDRESSES_PARAM).map(str::to_string),
        };
        if self.last_fetch.as_ref() == Some(&key) {
            return Route::Download;
        }

        let providers = decode_addresses(&location)
            .into_iter()
            .filter_map(|address| match address.to_multiaddr() {
                Ok(multiaddr) => Some(multiaddr),
                Err(err) => {
                    warn!(error = %err, "dropping unparsable provider address");
                    None
                }
            })
            .collect::<Vec<_>>();

        info!(
            content_id = %key.content_id,
            providers = providers.len(),
            "starting retrieval"
        );
        self.dispatch.dispatch(FilesAction::ResetFiles);
        self.dispatch.dispatch(FilesAction::FetchStart(FetchRequest {
            content_id: key.content_id.clone(),
            filename: String::new(),
            providers,
        }));
        self.last_fetch = Some(key);
        Route::Download
    }
}
