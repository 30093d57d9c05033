//! Shared constants for the dropkit crate.

// ── Geometry ────────────────────────────────────────────────────

/// Owner tag carried by the overlay's rect.
pub const OVERLAY_RECT_ID: &str = "overlay";

// ── Input ───────────────────────────────────────────────────────

/// Key name (as reported by the browser) that cancels an active drag.
pub const CANCEL_KEY: &str = "Escape";

// ── Configuration ───────────────────────────────────────────────

/// Environment variable selecting the intersection strategy.
pub const ENV_STRATEGY: &str = "DROPKIT_STRATEGY";

/// Environment variable holding the overlay offset as `<x>,<y>`.
pub const ENV_OVERLAY_OFFSET: &str = "DROPKIT_OVERLAY_OFFSET";
