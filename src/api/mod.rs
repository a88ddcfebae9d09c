//! Update API layer: request model, wire types and the HTTP client.

pub mod client;
pub mod request;
pub mod wire;

pub use client::{UpdateApi, UpdateApiClient};
pub use request::{
    validate_address, validate_json, validate_royalty, FieldKind, FormPart, PartBody,
    UpdateField, UpdateRequest,
};
pub use wire::{ApiErrorBody, UpdateResponse, UpdateResult};
