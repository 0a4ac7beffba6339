use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use axum::{debug_handler, Json};
use tracing::{debug, error};

use super::types::*;
use super::validate;
use crate::error::AuthError;
use crate::relayer::MintRequest;
use crate::rpc::RpcState;

/// Main dispatcher: routes incoming JSON-RPC requests to the correct handler.
///
/// Signup and login additionally mirror the session token into the
/// `Authorization` response header.
#[debug_handler]
pub async fn handle_rpc_request(
    State(state): State<RpcState>,
    headers: HeaderMap,
    Json(req): Json<RpcRequest>,
) -> (HeaderMap, Json<RpcResponse>) {
    debug!("RPC request: method={}, id={}", req.method, req.id);

    let mut response_headers = HeaderMap::new();

    let result = match req.method.as_str() {
        "auth.signup" | "auth.login" => {
            let outcome = if req.method == "auth.signup" {
                handle_signup(&state, req.params).await
            } else {
                handle_login(&state, req.params).await
            };
            match outcome {
                Ok(session) => {
                    let bearer = format!("Bearer {}", session.session_token);
                    if let Ok(value) = HeaderValue::from_str(&bearer) {
                        response_headers.insert(AUTHORIZATION, value);
                    }
                    to_json(&session)
                }
                Err(e) => Err(rpc_error(e)),
            }
        }
        "auth.verify" => handle_verify(&state, &headers)
            .await
            .and_then(|user| to_json(&user)),
        "relayer.mint" => handle_mint(&state, &headers, req.params)
            .await
            .and_then(|receipt| to_json(&receipt)),
        _ => Err(RpcError {
            code: -32601,
            message: format!("Method not found: {}", req.method),
        }),
    };

    let response = match result {
        Ok(val) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(val),
            error: None,
            id: req.id,
        },
        Err(err) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(err),
            id: req.id,
        },
    };
    (response_headers, Json(response))
}

//
// === Helpers ===
//

/// Map an internal error to its wire form, logging internal detail here
/// because the response deliberately omits it.
fn rpc_error(e: AuthError) -> RpcError {
    if let AuthError::Internal(detail) = &e {
        error!("internal error: {}", detail);
    }
    RpcError {
        code: e.rpc_code(),
        message: e.public_message(),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError {
        code: -32603,
        message: format!("Serialization error: {}", e),
    })
}

fn parse_params<T: serde::de::DeserializeOwned>(
    params: serde_json::Value,
) -> Result<T, AuthError> {
    serde_json::from_value(params)
        .map_err(|e| AuthError::Validation(format!("Invalid params: {}", e)))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::Unauthenticated)
}

//
// === Method handlers ===
//

async fn handle_signup(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<AuthResult, AuthError> {
    let params: SignupParams = parse_params(params)?;
    validate::validate_signup(&params.email, &params.username, &params.password)?;

    let session = state
        .auth
        .signup(&params.email, &params.username, &params.password)
        .await?;

    Ok(AuthResult {
        entropy: session.entropy,
        session_token: session.session_token,
        user: UserInfo::from(&session.user),
    })
}

async fn handle_login(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<AuthResult, AuthError> {
    let params: LoginParams = parse_params(params)?;
    validate::validate_login(&params.email, &params.password)?;

    let session = state.auth.login(&params.email, &params.password).await?;

    Ok(AuthResult {
        entropy: session.entropy,
        session_token: session.session_token,
        user: UserInfo::from(&session.user),
    })
}

async fn handle_verify(state: &RpcState, headers: &HeaderMap) -> Result<UserInfo, RpcError> {
    let result = async {
        let token = bearer_token(headers)?;
        let session = state.auth.validate(token).await?;
        Ok::<_, AuthError>(UserInfo::from(&session.user))
    }
    .await;
    result.map_err(rpc_error)
}

/// Mint a bike record to the caller's wallet via the external relayer.
/// Nothing is persisted before the relayer succeeds, so a relayer failure
/// cannot leave a half-registered bike.
async fn handle_mint(
    state: &RpcState,
    headers: &HeaderMap,
    params: serde_json::Value,
) -> Result<crate::relayer::MintReceipt, RpcError> {
    let result = async {
        let token = bearer_token(headers)?;
        let session = state.auth.validate(token).await?;

        let params: MintParams = parse_params(params)?;
        if params.name.is_empty() || params.serial_number.is_empty() {
            return Err(AuthError::Validation(
                "Name and serial number are required".to_string(),
            ));
        }

        state
            .relayer
            .mint(MintRequest {
                to: session.user.wallet_address.clone(),
                name: params.name,
                serial_number: params.serial_number,
                image_uri: params.image_uri,
            })
            .await
    }
    .await;
    result.map_err(rpc_error)
}
