// src/services/dashboard_service.rs

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    models::{
        dashboard::{DashboardData, FilterOptions, FilterState},
        livestock::{
            Animal, FeedingRecord, HealthCheckRecord, InventoryRecord, SaleRecord,
            VaccinationRecord,
        },
    },
    services::aggregation::{self, Sources},
};

// ---
// Fonte das coleções (o repositório Postgres em produção)
// ---
#[async_trait]
pub trait LivestockSource: Send + Sync {
    async fn inventory(&self) -> Result<Vec<InventoryRecord>, AppError>;
    async fn animals(&self) -> Result<Vec<Animal>, AppError>;
    async fn health_checks(&self) -> Result<Vec<HealthCheckRecord>, AppError>;
    async fn vaccinations(&self) -> Result<Vec<VaccinationRecord>, AppError>;
    async fn feedings(&self) -> Result<Vec<FeedingRecord>, AppError>;
    async fn sales(&self) -> Result<Vec<SaleRecord>, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Inventario,
    Animales,
    Controles,
    Vacunaciones,
    Alimentaciones,
    Ventas,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Inventario,
        Collection::Animales,
        Collection::Controles,
        Collection::Vacunaciones,
        Collection::Alimentaciones,
        Collection::Ventas,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Inventario => "inventario",
            Collection::Animales => "animales",
            Collection::Controles => "controles",
            Collection::Vacunaciones => "vacunaciones",
            Collection::Alimentaciones => "alimentaciones",
            Collection::Ventas => "ventas",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|collection| collection.name() == name)
            .ok_or_else(|| AppError::UnknownCollection(name.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CollectionStatus {
    pub coleccion: Collection,
    pub cargando: bool,
    pub error: Option<String>,
    pub version: u64,
    pub registros: usize,
}

// ---
// Slots: cada coleção carrega e falha de forma independente
// ---
struct Slot<T> {
    data: Option<Arc<Vec<T>>>,
    // Cargas em andamento; refreshes sobrepostos da mesma coleção somam.
    loads_in_flight: u32,
    error: Option<String>,
    version: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            data: None,
            loads_in_flight: 0,
            error: None,
            version: 0,
        }
    }
}

impl<T> Slot<T> {
    fn finish(&mut self, collection: Collection, result: Result<Vec<T>, AppError>) {
        self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
        self.version += 1;
        match result {
            Ok(rows) => {
                tracing::info!("📦 {} carregado: {} registros", collection.name(), rows.len());
                self.data = Some(Arc::new(rows));
                self.error = None;
            }
            Err(e) => {
                // Mantém o snapshot anterior, mas o erro bloqueia o painel.
                tracing::error!("🔥 Falha ao carregar {}: {}", collection.name(), e);
                self.error = Some(e.to_string());
            }
        }
    }

    fn status(&self, collection: Collection) -> CollectionStatus {
        CollectionStatus {
            coleccion: collection,
            cargando: self.loads_in_flight > 0,
            error: self.error.clone(),
            version: self.version,
            registros: self.data.as_ref().map_or(0, |rows| rows.len()),
        }
    }

    fn never_loaded(&self) -> bool {
        self.version == 0 && self.loads_in_flight == 0
    }

    // Carga abandonada antes de terminar: não altera dados nem versão.
    fn abandon(&mut self) {
        self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
    }
}

#[derive(Default)]
struct SourceStore {
    inventory: Slot<InventoryRecord>,
    animals: Slot<Animal>,
    health_checks: Slot<HealthCheckRecord>,
    vaccinations: Slot<VaccinationRecord>,
    feedings: Slot<FeedingRecord>,
    sales: Slot<SaleRecord>,
}

/// Cópia barata (Arcs) das seis coleções num dado instante.
struct Snapshot {
    inventory: Arc<Vec<InventoryRecord>>,
    animals: Arc<Vec<Animal>>,
    health_checks: Arc<Vec<HealthCheckRecord>>,
    vaccinations: Arc<Vec<VaccinationRecord>>,
    feedings: Arc<Vec<FeedingRecord>>,
    sales: Arc<Vec<SaleRecord>>,
    versions: [u64; 6],
}

impl Snapshot {
    fn sources(&self) -> Sources<'_> {
        Sources {
            inventory: &self.inventory,
            animals: &self.animals,
            health_checks: &self.health_checks,
            vaccinations: &self.vaccinations,
            feedings: &self.feedings,
            sales: &self.sales,
        }
    }
}

impl SourceStore {
    fn statuses(&self) -> Vec<CollectionStatus> {
        vec![
            self.inventory.status(Collection::Inventario),
            self.animals.status(Collection::Animales),
            self.health_checks.status(Collection::Controles),
            self.vaccinations.status(Collection::Vacunaciones),
            self.feedings.status(Collection::Alimentaciones),
            self.sales.status(Collection::Ventas),
        ]
    }

    fn mark_loading(&mut self, collection: Collection) {
        match collection {
            Collection::Inventario => self.inventory.loads_in_flight += 1,
            Collection::Animales => self.animals.loads_in_flight += 1,
            Collection::Controles => self.health_checks.loads_in_flight += 1,
            Collection::Vacunaciones => self.vaccinations.loads_in_flight += 1,
            Collection::Alimentaciones => self.feedings.loads_in_flight += 1,
            Collection::Ventas => self.sales.loads_in_flight += 1,
        }
    }

    fn abandon(&mut self, collection: Collection) {
        match collection {
            Collection::Inventario => self.inventory.abandon(),
            Collection::Animales => self.animals.abandon(),
            Collection::Controles => self.health_checks.abandon(),
            Collection::Vacunaciones => self.vaccinations.abandon(),
            Collection::Alimentaciones => self.feedings.abandon(),
            Collection::Ventas => self.sales.abandon(),
        }
    }

    fn never_loaded(&self) -> bool {
        self.inventory.never_loaded()
            || self.animals.never_loaded()
            || self.health_checks.never_loaded()
            || self.vaccinations.never_loaded()
            || self.feedings.never_loaded()
            || self.sales.never_loaded()
    }

    /// Só entrega o snapshot quando as seis coleções estão prontas e sem erro.
    fn snapshot(&self) -> Result<Snapshot, AppError> {
        let statuses = self.statuses();

        let pending = joined_names(statuses.iter().filter(|s| s.cargando));
        if !pending.is_empty() {
            return Err(AppError::SourcesLoading(pending));
        }
        let failed = joined_names(statuses.iter().filter(|s| s.error.is_some()));
        if !failed.is_empty() {
            return Err(AppError::SourcesUnavailable(failed));
        }

        let (
            Some(inventory),
            Some(animals),
            Some(health_checks),
            Some(vaccinations),
            Some(feedings),
            Some(sales),
        ) = (
            self.inventory.data.clone(),
            self.animals.data.clone(),
            self.health_checks.data.clone(),
            self.vaccinations.data.clone(),
            self.feedings.data.clone(),
            self.sales.data.clone(),
        )
        else {
            let missing = joined_names(statuses.iter().filter(|s| s.version == 0));
            return Err(AppError::SourcesLoading(missing));
        };

        Ok(Snapshot {
            inventory,
            animals,
            health_checks,
            vaccinations,
            feedings,
            sales,
            versions: [
                self.inventory.version,
                self.animals.version,
                self.health_checks.version,
                self.vaccinations.version,
                self.feedings.version,
                self.sales.version,
            ],
        })
    }
}

/// Marca coleções como carregando e, se o future for descartado antes de
/// `settle` (cliente desconectou, timeout), desfaz a marca no `Drop`.
struct LoadingGuard {
    store: Arc<Mutex<SourceStore>>,
    pending: Vec<Collection>,
}

impl LoadingGuard {
    fn start(
        handle: &Arc<Mutex<SourceStore>>,
        store: &mut SourceStore,
        collections: &[Collection],
    ) -> Self {
        for &collection in collections {
            store.mark_loading(collection);
        }
        Self {
            store: Arc::clone(handle),
            pending: collections.to_vec(),
        }
    }

    // Chamado logo após os `finish`, sem `.await` no meio.
    fn settle(&mut self) {
        self.pending.clear();
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        tracing::warn!("⚠️ Carga interrompida: {}", joined_names_of(&self.pending));
        if let Ok(mut store) = self.store.lock() {
            for collection in self.pending.drain(..) {
                store.abandon(collection);
            }
        }
    }
}

fn joined_names_of(collections: &[Collection]) -> String {
    collections
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn joined_names<'a>(statuses: impl Iterator<Item = &'a CollectionStatus>) -> String {
    statuses
        .map(|s| s.coleccion.name())
        .collect::<Vec<_>>()
        .join(", ")
}

// Chave da memoização: versões das coleções + filtros + data de referência.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MemoKey {
    versions: [u64; 6],
    filter: FilterState,
    today: NaiveDate,
}

struct Memo {
    key: MemoKey,
    data: Arc<DashboardData>,
}

// ---
// O serviço
// ---
#[derive(Clone)]
pub struct DashboardService {
    source: Arc<dyn LivestockSource>,
    store: Arc<Mutex<SourceStore>>,
    memo: Arc<Mutex<Option<Memo>>>,
}

impl DashboardService {
    pub fn new(source: Arc<dyn LivestockSource>) -> Self {
        Self {
            source,
            store: Arc::new(Mutex::new(SourceStore::default())),
            memo: Arc::new(Mutex::new(None)),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, SourceStore>, AppError> {
        self.store
            .lock()
            .map_err(|_| anyhow::anyhow!("Lock das coleções envenenado").into())
    }

    fn memo(&self) -> Result<MutexGuard<'_, Option<Memo>>, AppError> {
        self.memo
            .lock()
            .map_err(|_| anyhow::anyhow!("Lock do cache do painel envenenado").into())
    }

    pub fn statuses(&self) -> Result<Vec<CollectionStatus>, AppError> {
        Ok(self.store()?.statuses())
    }

    /// Recarrega as seis coleções em paralelo. Cada resultado cai no seu próprio slot:
    /// não há atomicidade entre coleções.
    pub async fn refresh_all(&self) -> Result<Vec<CollectionStatus>, AppError> {
        let guard = {
            let mut store = self.store()?;
            LoadingGuard::start(&self.store, &mut store, &Collection::ALL)
        };
        self.load_all(guard).await
    }

    async fn load_all(&self, mut guard: LoadingGuard) -> Result<Vec<CollectionStatus>, AppError> {
        let (inventory, animals, health_checks, vaccinations, feedings, sales) = tokio::join!(
            self.source.inventory(),
            self.source.animals(),
            self.source.health_checks(),
            self.source.vaccinations(),
            self.source.feedings(),
            self.source.sales(),
        );

        let mut store = self.store()?;
        store.inventory.finish(Collection::Inventario, inventory);
        store.animals.finish(Collection::Animales, animals);
        store.health_checks.finish(Collection::Controles, health_checks);
        store.vaccinations.finish(Collection::Vacunaciones, vaccinations);
        store.feedings.finish(Collection::Alimentaciones, feedings);
        store.sales.finish(Collection::Ventas, sales);
        guard.settle();

        Ok(store.statuses())
    }

    /// Recarrega uma única coleção; as outras continuam com o snapshot que já tinham.
    pub async fn refresh(&self, collection: Collection) -> Result<Vec<CollectionStatus>, AppError> {
        let mut guard = {
            let mut store = self.store()?;
            LoadingGuard::start(&self.store, &mut store, &[collection])
        };

        match collection {
            Collection::Inventario => {
                let rows = self.source.inventory().await;
                self.store()?.inventory.finish(collection, rows);
            }
            Collection::Animales => {
                let rows = self.source.animals().await;
                self.store()?.animals.finish(collection, rows);
            }
            Collection::Controles => {
                let rows = self.source.health_checks().await;
                self.store()?.health_checks.finish(collection, rows);
            }
            Collection::Vacunaciones => {
                let rows = self.source.vaccinations().await;
                self.store()?.vaccinations.finish(collection, rows);
            }
            Collection::Alimentaciones => {
                let rows = self.source.feedings().await;
                self.store()?.feedings.finish(collection, rows);
            }
            Collection::Ventas => {
                let rows = self.source.sales().await;
                self.store()?.sales.finish(collection, rows);
            }
        }
        guard.settle();

        self.statuses()
    }

    // Verifica e marca sob o mesmo lock: dois primeiros acessos simultâneos
    // disparam uma única carga.
    async fn ensure_loaded(&self) -> Result<(), AppError> {
        let guard = {
            let mut store = self.store()?;
            if !store.never_loaded() {
                return Ok(());
            }
            LoadingGuard::start(&self.store, &mut store, &Collection::ALL)
        };
        self.load_all(guard).await?;
        Ok(())
    }

    /// Dados do painel para os filtros informados. Recalcula apenas quando alguma
    /// coleção foi recarregada ou quando os filtros (ou o dia) mudam.
    pub async fn summary(
        &self,
        filter: FilterState,
        today: NaiveDate,
    ) -> Result<Arc<DashboardData>, AppError> {
        self.ensure_loaded().await?;
        let snapshot = self.store()?.snapshot()?;

        let key = MemoKey {
            versions: snapshot.versions,
            filter,
            today,
        };

        if let Some(memo) = self.memo()?.as_ref().filter(|memo| memo.key == key) {
            tracing::debug!("Painel servido do cache");
            return Ok(Arc::clone(&memo.data));
        }

        let data = Arc::new(aggregation::build_dashboard(
            &snapshot.sources(),
            &key.filter,
            key.today,
        ));
        *self.memo()? = Some(Memo {
            key,
            data: Arc::clone(&data),
        });

        Ok(data)
    }

    pub async fn filter_options(&self) -> Result<FilterOptions, AppError> {
        self.ensure_loaded().await?;
        let snapshot = self.store()?.snapshot()?;
        Ok(aggregation::filter_options(&snapshot.animals, &snapshot.inventory))
    }
}
