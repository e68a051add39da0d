use contracts::domain::common::DomainError;
use once_cell::sync::OnceCell;
use sea_orm::{
    ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;

use crate::shared::config;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Idempotent schema bootstrap. The contexto cascade relies on sqlx-sqlite
/// enabling `PRAGMA foreign_keys` on every pooled connection; the unique
/// index on (orden_ref, programa) is the store-level natural-key constraint
/// that catches concurrent creators of the same program.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS a001_formulario (
        id TEXT PRIMARY KEY NOT NULL,
        campania TEXT NOT NULL,
        mes TEXT NOT NULL,
        unidad_negocio TEXT NOT NULL,
        descripcion TEXT,
        estado TEXT NOT NULL DEFAULT 'abierto',
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a002_gasto (
        id TEXT PRIMARY KEY NOT NULL,
        proveedor TEXT NOT NULL,
        neto REAL NOT NULL,
        iva_pct REAL NOT NULL,
        importe_total REAL NOT NULL,
        estado TEXT NOT NULL DEFAULT 'pendiente',
        estado_pago TEXT NOT NULL DEFAULT 'creado',
        creado_por TEXT NOT NULL,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a003_orden (
        id TEXT PRIMARY KEY NOT NULL,
        numero TEXT NOT NULL,
        anunciante TEXT NOT NULL,
        agencia TEXT,
        mes TEXT NOT NULL,
        estado TEXT NOT NULL DEFAULT 'abierta',
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a003_orden_item (
        id TEXT PRIMARY KEY NOT NULL,
        orden_ref TEXT NOT NULL,
        programa TEXT NOT NULL,
        cadena TEXT,
        neto REAL NOT NULL,
        emisiones INTEGER,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS ux_a003_orden_item_programa
        ON a003_orden_item (orden_ref, programa);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a004_contexto (
        id TEXT PRIMARY KEY NOT NULL,
        gasto_ref TEXT NOT NULL REFERENCES a002_gasto (id) ON DELETE CASCADE,
        formulario_ref TEXT NOT NULL,
        area TEXT NOT NULL,
        orden_ref TEXT,
        centro_coste TEXT,
        mes_imputacion TEXT,
        detalle TEXT,
        extra_json TEXT,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS ux_a004_contexto_gasto
        ON a004_contexto (gasto_ref);
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS ix_a004_contexto_formulario
        ON a004_contexto (formulario_ref);
    "#,
];

fn build_sqlite_url(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    format!("sqlite://{}{}?mode=rwc", prefix, normalized)
}

async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for ddl in SCHEMA {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            (*ddl).to_string(),
        ))
        .await?;
    }
    Ok(())
}

/// Connect using config.toml and make sure the schema exists
pub async fn initialize_database() -> anyhow::Result<()> {
    let cfg = config::load_config()?;
    let db_path = config::get_database_path(&cfg)?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db_url = build_sqlite_url(&db_path);

    let conn = Database::connect(&db_url).await?;
    bootstrap_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    tracing::info!("Database ready at {}", db_path.display());
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}

/// Map a raw repository error onto the caller-facing taxonomy. Unique-index
/// violations become `UniqueViolation`; everything else is a store fault.
pub fn map_store_error(e: anyhow::Error) -> DomainError {
    if let Some(db_err) = e.downcast_ref::<DbErr>() {
        if let Some(SqlErr::UniqueConstraintViolation(msg)) = db_err.sql_err() {
            return DomainError::UniqueViolation(msg);
        }
    }
    DomainError::Store(e.to_string())
}

/// Test connection: a single temp-file SQLite database shared across every
/// test. A file (rather than `sqlite::memory:`) is used because each
/// `#[tokio::test]` runs on its own runtime and the global pool's connection
/// churns between tests; an in-memory database is destroyed the moment all
/// connections close, whereas committed DDL on a file survives. `IF NOT
/// EXISTS` makes concurrent bootstraps from the init race idempotent.
#[cfg(test)]
pub async fn init_test_database() {
    if DB_CONN.get().is_some() {
        return;
    }
    let db_path = std::env::temp_dir().join("backend_test.sqlite");
    // Start each test-binary run from a clean slate; runs exactly once,
    // before any connection opens the file.
    static CLEAN: std::sync::Once = std::sync::Once::new();
    CLEAN.call_once(|| {
        let _ = std::fs::remove_file(&db_path);
    });
    let db_url = build_sqlite_url(&db_path);
    let conn = Database::connect(&db_url)
        .await
        .expect("test sqlite must connect");
    bootstrap_schema(&conn)
        .await
        .expect("test schema bootstrap failed");
    // a second test may have won the race; its connection is equivalent
    let _ = DB_CONN.set(conn);
}
