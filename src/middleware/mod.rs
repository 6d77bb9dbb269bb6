/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: 3 stage の interceptor / pipeline: route ごとの組み立て / http・cors: 横断的関心事
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod pipeline;
pub mod security_headers;

pub use pipeline::Pipeline;
