/*
 * Responsibility
 * - per-request の key/value scope
 *
 * Notes
 * - `http::Extensions` は型をキーにした map なので、各 stage は自分だけが構築できる
 *   private newtype をキーにする。別 stage の値を上書きすることはできない。
 */

/// Request-scoped store shared by the interceptor chain and the resolver.
pub type RequestContext = axum::http::Extensions;
