// src/models/dashboard.rs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::livestock::VaccinationRecord;

/// Valor "todas" usado pelo front-end nos selects de espécie e localização.
pub const ALL_SENTINEL: &str = "todas";

// ---
// Estado dos filtros
// ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum SpeciesFilter {
    #[default]
    All,
    Specific(String),
}

impl SpeciesFilter {
    /// Ausente ou "todas" viram `All`; qualquer outro valor é comparado literalmente.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            None | Some(ALL_SENTINEL) => Self::All,
            Some(name) => Self::Specific(name.to_string()),
        }
    }

    // Comparação exata, sensível a maiúsculas. Espécie desconhecida nunca casa com um filtro específico.
    pub fn matches(&self, common_name: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Specific(wanted) => common_name == Some(wanted.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum LocationFilter {
    #[default]
    All,
    Specific(String),
}

impl LocationFilter {
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            None | Some(ALL_SENTINEL) => Self::All,
            Some(id) => Self::Specific(id.to_string()),
        }
    }

    pub fn matches(&self, location_id: Option<i32>) -> bool {
        match self {
            Self::All => true,
            Self::Specific(wanted) => location_id.is_some_and(|id| id.to_string() == *wanted),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Só filtra quando as duas pontas estão definidas.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.from.zip(self.to)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match self.bounds() {
            Some((from, to)) => from <= date && date <= to,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterState {
    pub date_range: DateRange,
    pub species: SpeciesFilter,
    pub location: LocationFilter,
}

// ---
// Saídas do dashboard (formato consumido pelos gráficos)
// ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NameValue {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NameAmount {
    pub name: String,
    pub value: Decimal,
}

// Ponto da linha de tendência do inventário
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DatedCount {
    pub fecha: String,
    pub cantidad: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SpeciesBreeds {
    pub especie: String,
    pub razas: Vec<NameValue>,
}

// Uma linha por data; um campo por espécie presente naquela data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightRow {
    pub fecha: NaiveDate,
    #[serde(flatten)]
    pub promedios: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SalesPoint {
    pub fecha: NaiveDate,
    pub ingresos: Decimal,
    pub ventas: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingVaccination {
    pub vacunacion: VaccinationRecord,
    pub fecha_proxima: NaiveDate,
    pub dias_restantes: i64,
}

/// Tudo o que o painel de resumo exibe.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub total_activos: u64,
    pub total_especies: u64,
    pub tasa_crecimiento: f64,
    pub proximas_vacunaciones: Vec<UpcomingVaccination>,
    pub animales_por_ubicacion: Vec<NameValue>,
    pub animales_por_lote: Vec<NameValue>,
    pub inventario_por_fecha: Vec<DatedCount>,
    pub especie_count: Vec<NameValue>,
    pub especie_raza: Vec<SpeciesBreeds>,
    #[schema(value_type = Vec<Object>)]
    pub peso_promedio_data: Vec<WeightRow>,
    pub vacunas_por_tipo: Vec<NameValue>,
    pub alimentos_por_tipo: Vec<NameAmount>,
    pub ventas_data: Vec<SalesPoint>,
    pub razas: Vec<String>,
    pub especies_nombres: Vec<String>,
}

// Opções dos selects de filtro, cada lista começando por "todas".
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FilterOptions {
    pub especies: Vec<String>,
    pub ubicaciones: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_maps_to_all_variant() {
        assert_eq!(SpeciesFilter::from_param(None), SpeciesFilter::All);
        assert_eq!(SpeciesFilter::from_param(Some("todas")), SpeciesFilter::All);
        assert_eq!(
            SpeciesFilter::from_param(Some("Bovino")),
            SpeciesFilter::Specific("Bovino".into())
        );
        assert_eq!(LocationFilter::from_param(Some("todas")), LocationFilter::All);
    }

    #[test]
    fn species_match_is_exact_and_case_sensitive() {
        let filter = SpeciesFilter::Specific("Bovino".into());
        assert!(filter.matches(Some("Bovino")));
        assert!(!filter.matches(Some("bovino")));
        assert!(!filter.matches(None));
        assert!(SpeciesFilter::All.matches(None));
    }

    #[test]
    fn location_match_compares_stringified_id() {
        let filter = LocationFilter::Specific("3".into());
        assert!(filter.matches(Some(3)));
        assert!(!filter.matches(Some(30)));
        assert!(!filter.matches(None));
        assert!(LocationFilter::All.matches(None));
    }

    #[test]
    fn date_range_needs_both_ends() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let open = DateRange { from: Some(day(10)), to: None };
        assert!(open.contains(day(1)));

        let closed = DateRange { from: Some(day(10)), to: Some(day(20)) };
        assert!(closed.contains(day(10)));
        assert!(closed.contains(day(20)));
        assert!(!closed.contains(day(21)));
    }

    #[test]
    fn weight_row_flattens_species_columns() {
        let mut promedios = BTreeMap::new();
        promedios.insert("Bovino".to_string(), Decimal::new(35025, 2));
        let row = WeightRow {
            fecha: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            promedios,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["fecha"], "2024-01-02");
        assert_eq!(json["Bovino"], 350.25);
    }
}
