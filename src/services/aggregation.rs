// src/services/aggregation.rs

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{
    dashboard::{
        ALL_SENTINEL, DashboardData, DatedCount, FilterOptions, FilterState, NameAmount,
        NameValue, SalesPoint, SpeciesBreeds, UpcomingVaccination, WeightRow,
    },
    livestock::{
        Animal, FeedingRecord, HealthCheckRecord, InventoryRecord, SaleRecord, VaccinationRecord,
    },
};

pub const NO_LOCATION: &str = "Sin ubicación";
pub const NO_LOT: &str = "Sin lote";
pub const UNKNOWN_SPECIES: &str = "Desconocida";

/// Janela (em dias, inclusiva) dos alertas de próxima vacinação.
pub const UPCOMING_WINDOW_DAYS: i64 = 15;

/// Snapshot emprestado das seis coleções. O motor nunca altera nada aqui.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    pub inventory: &'a [InventoryRecord],
    pub animals: &'a [Animal],
    pub health_checks: &'a [HealthCheckRecord],
    pub vaccinations: &'a [VaccinationRecord],
    pub feedings: &'a [FeedingRecord],
    pub sales: &'a [SaleRecord],
}

// ---
// Tally: mapa de frequência que preserva a ordem de inserção
// ---

#[derive(Debug, Clone)]
pub struct Tally<V> {
    slots: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> Default for Tally<V> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<V: Default> Tally<V> {
    pub fn entry(&mut self, key: impl Into<String>) -> &mut V {
        let key = key.into();
        let index = match self.slots.get(&key) {
            Some(&index) => index,
            None => {
                let index = self.entries.len();
                self.slots.insert(key.clone(), index);
                self.entries.push((key, V::default()));
                index
            }
        };
        &mut self.entries[index].1
    }
}

impl<V> Tally<V> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

}

impl Tally<u64> {
    pub fn bump(&mut self, key: impl Into<String>) {
        *self.entry(key) += 1;
    }
}

/// Converte um mapa de frequência em pares `{name, value}`, na ordem de inserção.
pub fn format_bar_data(tally: &Tally<u64>) -> Vec<NameValue> {
    tally
        .iter()
        .map(|(name, value)| NameValue {
            name: name.to_string(),
            value: *value,
        })
        .collect()
}

/// Igual ao `format_bar_data`, mas chaveado por data e ordenado de forma crescente.
pub fn format_line_data(tally: &Tally<u64>) -> Vec<DatedCount> {
    let mut points: Vec<DatedCount> = tally
        .iter()
        .map(|(fecha, cantidad)| DatedCount {
            fecha: fecha.to_string(),
            cantidad: *cantidad,
        })
        .collect();
    points.sort_by(|a, b| a.fecha.cmp(&b.fecha));
    points
}

fn format_amount_data(tally: &Tally<Decimal>) -> Vec<NameAmount> {
    tally
        .iter()
        .map(|(name, value)| NameAmount {
            name: name.to_string(),
            value: *value,
        })
        .collect()
}

// Índice animal_id -> animal. Em caso de id repetido vale o primeiro.
fn index_animals(animals: &[Animal]) -> HashMap<i64, &Animal> {
    let mut index = HashMap::with_capacity(animals.len());
    for animal in animals {
        index.entry(animal.animal_id).or_insert(animal);
    }
    index
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}

// ---
// Filtro do subconjunto ativo
// ---

/// Registros ativos na fazenda que passam por todos os filtros (data, espécie, localização).
/// Mantém a ordem original.
pub fn active_subset<'a>(
    inventory: &'a [InventoryRecord],
    animals: &[Animal],
    filter: &FilterState,
) -> Vec<&'a InventoryRecord> {
    let animals = index_animals(animals);
    inventory
        .iter()
        .filter(|record| record.active)
        .filter(|record| filter.date_range.contains(record.entry_date))
        .filter(|record| {
            let species = animals
                .get(&record.animal_id)
                .map(|animal| animal.species.common_name.as_str());
            filter.species.matches(species)
        })
        .filter(|record| filter.location.matches(record.location_id))
        .collect()
}

// ---
// Motor de agregação
// ---

// Espécie com nome vazio não conta como espécie distinta.
fn species_diversity(by_species: &Tally<u64>) -> u64 {
    by_species.iter().filter(|(name, _)| !name.is_empty()).count() as u64
}

pub fn build_dashboard(sources: &Sources<'_>, filter: &FilterState, today: NaiveDate) -> DashboardData {
    let active = active_subset(sources.inventory, sources.animals, filter);
    let animals = index_animals(sources.animals);

    let active_animal_ids: HashSet<i64> = active.iter().map(|record| record.animal_id).collect();
    let active_lot_ids: HashSet<i32> = active.iter().filter_map(|record| record.lot_id).collect();

    // Agrupamentos simples sobre o subconjunto ativo
    let mut by_location: Tally<u64> = Tally::default();
    let mut by_lot: Tally<u64> = Tally::default();
    let mut by_entry_date: Tally<u64> = Tally::default();
    let mut by_species: Tally<u64> = Tally::default();
    let mut by_species_breed: Tally<Tally<u64>> = Tally::default();

    for record in &active {
        by_location.bump(
            record
                .location_id
                .map_or_else(|| NO_LOCATION.to_string(), |id| id.to_string()),
        );
        by_lot.bump(
            record
                .lot_id
                .map_or_else(|| NO_LOT.to_string(), |id| id.to_string()),
        );
        by_entry_date.bump(record.entry_date.format("%Y-%m-%d").to_string());

        if let Some(animal) = animals.get(&record.animal_id) {
            by_species.bump(animal.species.common_name.as_str());
            by_species_breed
                .entry(animal.species.common_name.as_str())
                .bump(animal.breed.name.as_str());
        }
    }

    let total_activos = active.len() as u64;
    let baseline = baseline_count(sources.inventory, filter);

    let data = DashboardData {
        total_activos,
        total_especies: species_diversity(&by_species),
        tasa_crecimiento: growth_rate(total_activos, baseline),
        proximas_vacunaciones: upcoming_vaccinations(sources.vaccinations, today),
        animales_por_ubicacion: format_bar_data(&by_location),
        animales_por_lote: format_bar_data(&by_lot),
        inventario_por_fecha: format_line_data(&by_entry_date),
        especie_count: format_bar_data(&by_species),
        especie_raza: by_species_breed
            .iter()
            .map(|(especie, breeds)| SpeciesBreeds {
                especie: especie.to_string(),
                razas: format_bar_data(breeds),
            })
            .collect(),
        peso_promedio_data: average_weight_by_date(
            sources.health_checks,
            &animals,
            &active_animal_ids,
        ),
        vacunas_por_tipo: vaccinations_by_type(sources.vaccinations, &active_animal_ids),
        alimentos_por_tipo: feed_by_type(sources.feedings, &active_animal_ids),
        ventas_data: sales_by_date(sources.sales, &active_lot_ids),
        razas: distinct(sources.animals.iter().map(|a| a.breed.name.as_str())),
        especies_nombres: distinct(sources.animals.iter().map(|a| a.species.common_name.as_str())),
    };

    tracing::debug!(
        activos = data.total_activos,
        especies = data.total_especies,
        alertas = data.proximas_vacunaciones.len(),
        "Dashboard recalculado"
    );

    data
}

// Registros ativos que entraram no mês imediatamente anterior ao `from` do filtro.
fn baseline_count(inventory: &[InventoryRecord], filter: &FilterState) -> u64 {
    let Some(from) = filter.date_range.from else {
        return 0;
    };
    let month_before = from.checked_sub_months(Months::new(1)).unwrap_or(from);

    inventory
        .iter()
        .filter(|record| record.active)
        .filter(|record| record.entry_date >= month_before && record.entry_date < from)
        .count() as u64
}

/// Variação percentual contra o período anterior; 0 quando não há base de comparação.
pub fn growth_rate(current: u64, baseline: u64) -> f64 {
    if baseline == 0 {
        return 0.0;
    }
    (current as f64 - baseline as f64) / baseline as f64 * 100.0
}

fn average_weight_by_date(
    health_checks: &[HealthCheckRecord],
    animals: &HashMap<i64, &Animal>,
    active_animal_ids: &HashSet<i64>,
) -> Vec<WeightRow> {
    // data -> espécie -> (soma, quantidade)
    let mut buckets: BTreeMap<NaiveDate, BTreeMap<String, (Decimal, u32)>> = BTreeMap::new();

    for check in health_checks {
        let Some(weight) = check.weight_kg else {
            continue;
        };
        let Some(animal) = animals.get(&check.animal_id) else {
            continue;
        };
        if !active_animal_ids.contains(&check.animal_id) {
            continue;
        }

        let species = match animal.species.common_name.as_str() {
            "" => UNKNOWN_SPECIES,
            name => name,
        };
        let (sum, count) = buckets
            .entry(check.check_date)
            .or_default()
            .entry(species.to_string())
            .or_insert((Decimal::ZERO, 0));
        *sum += weight;
        *count += 1;
    }

    buckets
        .into_iter()
        .map(|(fecha, species)| WeightRow {
            fecha,
            promedios: species
                .into_iter()
                .map(|(name, (sum, count))| (name, mean_2dp(sum, count)))
                .collect(),
        })
        .collect()
}

fn mean_2dp(sum: Decimal, count: u32) -> Decimal {
    (sum / Decimal::from(count)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn vaccinations_by_type(
    vaccinations: &[VaccinationRecord],
    active_animal_ids: &HashSet<i64>,
) -> Vec<NameValue> {
    let mut tally: Tally<u64> = Tally::default();
    for vaccination in vaccinations
        .iter()
        .filter(|v| active_animal_ids.contains(&v.animal_id))
    {
        tally.bump(vaccination.vaccine_type_id.to_string());
    }
    format_bar_data(&tally)
}

fn feed_by_type(feedings: &[FeedingRecord], active_animal_ids: &HashSet<i64>) -> Vec<NameAmount> {
    let mut tally: Tally<Decimal> = Tally::default();
    for feeding in feedings
        .iter()
        .filter(|f| active_animal_ids.contains(&f.animal_id))
    {
        *tally.entry(feeding.feed_type_id.to_string()) += feeding.quantity;
    }
    format_amount_data(&tally)
}

fn sales_by_date(sales: &[SaleRecord], active_lot_ids: &HashSet<i32>) -> Vec<SalesPoint> {
    let mut by_date: BTreeMap<NaiveDate, (Decimal, u64)> = BTreeMap::new();

    for sale in sales {
        let Some(lot_id) = sale.origin_lot_id else {
            continue;
        };
        if !active_lot_ids.contains(&lot_id) {
            continue;
        }
        let (income, count) = by_date.entry(sale.sold_on).or_insert((Decimal::ZERO, 0));
        *income += sale.total_price.unwrap_or(Decimal::ZERO);
        *count += 1;
    }

    by_date
        .into_iter()
        .map(|(fecha, (ingresos, ventas))| SalesPoint {
            fecha,
            ingresos,
            ventas,
        })
        .collect()
}

/// Vacinações cuja próxima dose vence entre hoje e daqui a 15 dias (inclusive).
/// Varre a coleção inteira: os alertas não respeitam os filtros do painel.
pub fn upcoming_vaccinations(
    vaccinations: &[VaccinationRecord],
    today: NaiveDate,
) -> Vec<UpcomingVaccination> {
    vaccinations
        .iter()
        .filter_map(|vaccination| {
            let due = vaccination.projected_due_date();
            let days_left = (due - today).num_days();
            (0..=UPCOMING_WINDOW_DAYS)
                .contains(&days_left)
                .then(|| UpcomingVaccination {
                    vacunacion: vaccination.clone(),
                    fecha_proxima: due,
                    dias_restantes: days_left,
                })
        })
        .collect()
}

// ---
// Opções dos filtros
// ---

/// Espécies e localizações conhecidas, sempre a partir das coleções completas.
pub fn filter_options(animals: &[Animal], inventory: &[InventoryRecord]) -> FilterOptions {
    let mut especies = vec![ALL_SENTINEL.to_string()];
    especies.extend(distinct(
        animals.iter().map(|animal| animal.species.common_name.as_str()),
    ));

    let mut ubicaciones = vec![ALL_SENTINEL.to_string()];
    let mut seen = HashSet::new();
    ubicaciones.extend(
        inventory
            .iter()
            .filter_map(|record| record.location_id)
            .filter(|id| seen.insert(*id))
            .map(|id| id.to_string()),
    );

    FilterOptions {
        especies,
        ubicaciones,
    }
}
