//! Handlers for transactions, debtors, investments, debt history and
//! settings. Every handler acts on behalf of the session's user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use fintrack_core::models::{
    DebtorPatch, InvestmentPatch, NewDebtor, NewInvestment, NewTransaction, TransactionPatch,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::auth::CurrentUser;
use super::{blocking, ApiError, AppState};

type Created = (StatusCode, Json<Value>);

/// Parses a request body, reporting shape errors as a bad request.
fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

// ============================================================================
// Transactions
// ============================================================================

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.transactions();
    let transactions = blocking(move || repo.list_for_user(&user.user_id)).await?;
    Ok(Json(json!({ "sucesso": true, "transacoes": transactions })))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<Created, ApiError> {
    let input: NewTransaction = parse_body(body)?;
    let repo = state.transactions();
    let transaction = blocking(move || repo.create(&user.user_id, input)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "sucesso": true,
            "mensagem": "Transaction created",
            "transacao": transaction,
        })),
    ))
}

pub async fn transaction_balance(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.transactions();
    let balance = blocking(move || repo.balance(&user.user_id)).await?;
    Ok(Json(json!({ "sucesso": true, "saldo": balance })))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.transactions();
    let transaction = blocking(move || repo.get(&user.user_id, &id)).await?;
    Ok(Json(json!({ "sucesso": true, "transacao": transaction })))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let patch: TransactionPatch = parse_body(body)?;
    let repo = state.transactions();
    let transaction = blocking(move || repo.update(&user.user_id, &id, patch)).await?;
    Ok(Json(json!({
        "sucesso": true,
        "mensagem": "Transaction updated",
        "transacao": transaction,
    })))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.transactions();
    blocking(move || repo.delete(&user.user_id, &id)).await?;
    Ok(Json(json!({ "sucesso": true, "mensagem": "Transaction deleted" })))
}

// ============================================================================
// Debtors
// ============================================================================

pub async fn list_debtors(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.debtors();
    let debtors = blocking(move || repo.list_for_user(&user.user_id)).await?;
    Ok(Json(json!({ "sucesso": true, "devedores": debtors })))
}

pub async fn create_debtor(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<Created, ApiError> {
    let input: NewDebtor = parse_body(body)?;
    let repo = state.debtors();
    let debtor = blocking(move || repo.create(&user.user_id, input)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "sucesso": true,
            "mensagem": "Debtor created",
            "devedor": debtor,
        })),
    ))
}

pub async fn get_debtor(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.debtors();
    let debtor = blocking(move || repo.get(&user.user_id, &id)).await?;
    Ok(Json(json!({ "sucesso": true, "devedor": debtor })))
}

pub async fn update_debtor(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let patch: DebtorPatch = parse_body(body)?;
    let repo = state.debtors();
    let debtor = blocking(move || repo.update(&user.user_id, &id, patch)).await?;
    Ok(Json(json!({
        "sucesso": true,
        "mensagem": "Debtor updated",
        "devedor": debtor,
    })))
}

pub async fn delete_debtor(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.debtors();
    blocking(move || repo.delete(&user.user_id, &id)).await?;
    Ok(Json(json!({ "sucesso": true, "mensagem": "Debtor deleted" })))
}

// ============================================================================
// Investments
// ============================================================================

pub async fn list_investments(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.investments();
    let investments = blocking(move || repo.list_for_user(&user.user_id)).await?;
    Ok(Json(json!({ "sucesso": true, "investimentos": investments })))
}

pub async fn create_investment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<Created, ApiError> {
    let input: NewInvestment = parse_body(body)?;
    let repo = state.investments();
    let investment = blocking(move || repo.create(&user.user_id, input)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "sucesso": true,
            "mensagem": "Investment created",
            "investimento": investment,
        })),
    ))
}

pub async fn investment_total(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.investments();
    let total = blocking(move || repo.total_invested(&user.user_id)).await?;
    Ok(Json(json!({ "sucesso": true, "total": total })))
}

pub async fn get_investment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.investments();
    let investment = blocking(move || repo.get(&user.user_id, &id)).await?;
    Ok(Json(json!({ "sucesso": true, "investimento": investment })))
}

pub async fn update_investment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let patch: InvestmentPatch = parse_body(body)?;
    let repo = state.investments();
    let investment = blocking(move || repo.update(&user.user_id, &id, patch)).await?;
    Ok(Json(json!({
        "sucesso": true,
        "mensagem": "Investment updated",
        "investimento": investment,
    })))
}

pub async fn delete_investment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.investments();
    blocking(move || repo.delete(&user.user_id, &id)).await?;
    Ok(Json(json!({ "sucesso": true, "mensagem": "Investment deleted" })))
}

// ============================================================================
// Debt history
// ============================================================================

pub async fn list_history(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.debt_history();
    let history = blocking(move || repo.list_for_user(&user.user_id)).await?;
    Ok(Json(json!({ "sucesso": true, "historico": history })))
}

pub async fn debtor_history(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(debtor_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.debt_history();
    let history = blocking(move || repo.list_for_debtor(&user.user_id, &debtor_id)).await?;
    Ok(Json(json!({ "sucesso": true, "historico": history })))
}

// ============================================================================
// Settings
// ============================================================================

pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = state.store.clone();
    let settings = blocking(move || store.settings()).await?;
    Ok(Json(json!({ "sucesso": true, "configuracoes": settings })))
}

/// Merges the body into the settings. A `null` value removes the key.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let Value::Object(patch) = body else {
        return Err(ApiError::BadRequest(
            "Settings must be a JSON object".to_string(),
        ));
    };
    let store = state.store.clone();
    let settings = blocking(move || store.update_settings(patch)).await?;
    Ok(Json(json!({
        "sucesso": true,
        "mensagem": "Settings updated",
        "configuracoes": settings,
    })))
}
