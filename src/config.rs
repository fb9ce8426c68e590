// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use sqlx::PgPool;

use crate::{
    db::{InventoryStore, MemoryStore, PgStore},
    services::{CatalogService, KitService, LedgerService, ProductionService},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("STORAGE_BACKEND inválido: '{}' (use postgres ou memory)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub request_timeout: Duration,
    pub order_number_prefix: String,
}

impl Config {
    /// Lê o `.env` (se existir) e as variáveis de ambiente.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let parse_or = |key: &str, default: u64| -> anyhow::Result<u64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} deve ser um número inteiro", key)),
                None => Ok(default),
            }
        };

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Postgres,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL deve ser definida para o backend postgres"));
        }

        let db_max_connections = u32::try_from(parse_or("DB_MAX_CONNECTIONS", 5)?)
            .context("DB_MAX_CONNECTIONS fora do intervalo")?;

        Ok(Self {
            storage_backend,
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(parse_or("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            request_timeout: Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", 30)?),
            order_number_prefix: lookup("ORDER_NUMBER_PREFIX")
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "OP".to_string()),
        })
    }
}

// O estado compartilhado que será acessível em todos os handlers
#[derive(Clone)]
pub struct AppState {
    /// Presente só no backend Postgres (migrações na inicialização).
    pub db_pool: Option<PgPool>,
    pub catalog_service: CatalogService,
    pub kit_service: KitService,
    pub ledger_service: LedgerService,
    pub production_service: ProductionService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        match config.storage_backend {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("DATABASE_URL deve ser definida"))?;
                let store = PgStore::connect(url, config.db_max_connections, config.db_acquire_timeout)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                let pool = store.pool().clone();
                let mut state = Self::with_store(Arc::new(store), &config.order_number_prefix);
                state.db_pool = Some(pool);
                Ok(state)
            }
            StorageBackend::Memory => {
                tracing::warn!("Backend em memória: os dados se perdem ao encerrar o processo.");
                Ok(Self::with_store(Arc::new(MemoryStore::new()), &config.order_number_prefix))
            }
        }
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_store(store: Arc<dyn InventoryStore>, order_number_prefix: &str) -> Self {
        Self {
            db_pool: None,
            catalog_service: CatalogService::new(store.clone()),
            kit_service: KitService::new(store.clone()),
            ledger_service: LedgerService::new(store.clone()),
            production_service: ProductionService::new(store, order_number_prefix),
        }
    }

    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), "OP")
    }
}
