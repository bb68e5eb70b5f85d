//! Backend database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary with include_str! and applied in
//! order. Each entry is (file name, sql).

/// Backend migrations for `donify.duckdb` and `demo.duckdb`
///
/// When adding a migration, create `NNN_description.sql` and append it here.
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
