/// Router Module Index
///
/// Splits the routing table by audience. Access control itself is applied
/// once, by the access gate in `create_router`; handlers that mutate or expose
/// admin data additionally require an `AdminSession`.

/// Health, site views, the public pages, enquiry submission and the auth endpoints.
pub mod public;

/// The CRUD API, registered once per content kind.
pub mod content;

/// Admin pages and the admin-only JSON endpoints (enquiry inbox, stats).
pub mod admin;
