/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - 認証済みリクエストの Principal を handler に提供する
 * - HTTP / axum 依存は core に閉じ込める
 */

mod core;

pub use self::core::CurrentPrincipal;
