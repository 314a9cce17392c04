//! Background API jobs so the UI never waits on the network.
//!
//! Page loads carry the generation they were started under; the state drops
//! results from an older generation (the user navigated away meanwhile).

use std::path::PathBuf;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::mpsc;

use crate::api::client::Page;
use crate::api::stream::ChunkStream;
use crate::api::{ApiClient, ApiError};
use crate::config::ExplainTransport;
use crate::core::model::{
    Analytics, Contract, ContractWithReview, RegisterRequest, ReviewRequest, User,
};

pub enum ApiUpdate {
    SignedIn(Result<User, ApiError>),
    Registered(Result<User, ApiError>),
    CurrentUser(Result<User, ApiError>),
    Contracts {
        generation: u64,
        page: Page,
        result: Result<Vec<Contract>, ApiError>,
    },
    ContractReview {
        generation: u64,
        contract_id: String,
        result: Result<ContractWithReview, ApiError>,
    },
    ReviewFinished {
        contract_id: String,
        result: Result<ContractWithReview, ApiError>,
    },
    Uploaded(Result<Contract, ApiError>),
    Analytics {
        generation: u64,
        result: Result<Analytics, ApiError>,
    },
}

pub fn spawn_sign_in(
    tx: mpsc::UnboundedSender<ApiUpdate>,
    api: ApiClient,
    email: String,
    password: String,
) {
    tokio::spawn(async move {
        let result = api.user().sign_in(&email, &password).await;
        let _ = tx.send(ApiUpdate::SignedIn(result));
    });
}

pub fn spawn_register(tx: mpsc::UnboundedSender<ApiUpdate>, api: ApiClient, payload: RegisterRequest) {
    tokio::spawn(async move {
        let result = api.user().register(&payload).await;
        let _ = tx.send(ApiUpdate::Registered(result));
    });
}

pub fn spawn_current_user(tx: mpsc::UnboundedSender<ApiUpdate>, api: ApiClient) {
    tokio::spawn(async move {
        let result = api.user().current().await;
        let _ = tx.send(ApiUpdate::CurrentUser(result));
    });
}

pub fn spawn_contract_list(
    tx: mpsc::UnboundedSender<ApiUpdate>,
    api: ApiClient,
    generation: u64,
    page: Page,
) {
    tokio::spawn(async move {
        let result = api.contract().list(Some(page)).await;
        let _ = tx.send(ApiUpdate::Contracts {
            generation,
            page,
            result,
        });
    });
}

pub fn spawn_review_load(
    tx: mpsc::UnboundedSender<ApiUpdate>,
    api: ApiClient,
    generation: u64,
    contract_id: String,
) {
    tokio::spawn(async move {
        let result = api.contract().get_review(&contract_id).await;
        let _ = tx.send(ApiUpdate::ContractReview {
            generation,
            contract_id,
            result,
        });
    });
}

/// Run the AI review.  Not generation-tagged: the toast should appear even
/// if the user has moved on.
pub fn spawn_review_run(
    tx: mpsc::UnboundedSender<ApiUpdate>,
    api: ApiClient,
    contract_id: String,
    request: ReviewRequest,
) {
    tokio::spawn(async move {
        tracing::info!(%contract_id, "review requested");
        let result = api.contract().review(&contract_id, &request).await;
        let _ = tx.send(ApiUpdate::ReviewFinished { contract_id, result });
    });
}

pub fn spawn_upload(
    tx: mpsc::UnboundedSender<ApiUpdate>,
    api: ApiClient,
    path: PathBuf,
    title: String,
) {
    tokio::spawn(async move {
        let result = api.contract().upload(&path, &title).await;
        let _ = tx.send(ApiUpdate::Uploaded(result));
    });
}

pub fn spawn_analytics(tx: mpsc::UnboundedSender<ApiUpdate>, api: ApiClient, generation: u64) {
    tokio::spawn(async move {
        let result = api.analytics().overview().await;
        let _ = tx.send(ApiUpdate::Analytics { generation, result });
    });
}

/// Lazily request a clause explanation.  Nothing is sent until the stream
/// is first polled, and dropping it closes the connection, so the reveal
/// session owns the request's whole lifetime.
pub fn explain_chunks(
    api: ApiClient,
    contract_id: String,
    clause: String,
    transport: ExplainTransport,
) -> ChunkStream {
    match transport {
        ExplainTransport::Stream => stream::once(async move {
            api.contract().explain_clause_stream(&contract_id, &clause).await
        })
        .try_flatten()
        .boxed(),
        ExplainTransport::Buffered => stream::once(async move {
            api.contract().explain_clause(&contract_id, &clause).await
        })
        .boxed(),
    }
}
