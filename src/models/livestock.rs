// src/models/livestock.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Motivos de entrada/saída do inventário ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "motivo_ingreso")]
pub enum EntryReason {
    #[serde(rename = "Nacimiento")]
    #[sqlx(rename = "Nacimiento")]
    Birth,
    #[serde(rename = "Compra")]
    #[sqlx(rename = "Compra")]
    Purchase,
    #[serde(rename = "TrasladoInterno")]
    #[sqlx(rename = "TrasladoInterno")]
    InternalTransfer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "motivo_egreso")]
pub enum ExitReason {
    #[serde(rename = "Venta")]
    #[sqlx(rename = "Venta")]
    Sale,
    #[serde(rename = "Muerte")]
    #[sqlx(rename = "Muerte")]
    Death,
    #[serde(rename = "Descartado")]
    #[sqlx(rename = "Descartado")]
    Discard,
    #[serde(rename = "TrasladoExterno")]
    #[sqlx(rename = "TrasladoExterno")]
    ExternalTransfer,
}

// --- 1. Inventário (um episódio de presença do animal na fazenda) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InventoryRecord {
    #[serde(rename = "inventario_id")]
    #[sqlx(rename = "inventario_id")]
    pub id: i64,
    pub animal_id: i64,
    #[serde(rename = "fecha_ingreso")]
    #[sqlx(rename = "fecha_ingreso")]
    pub entry_date: NaiveDate,
    #[serde(rename = "motivo_ingreso")]
    #[sqlx(rename = "motivo_ingreso")]
    pub entry_reason: EntryReason,
    #[serde(rename = "ubicacion_actual_id")]
    #[sqlx(rename = "ubicacion_actual_id")]
    pub location_id: Option<i32>,
    #[serde(rename = "lote_actual_id")]
    #[sqlx(rename = "lote_actual_id")]
    pub lot_id: Option<i32>,
    #[serde(rename = "fecha_egreso")]
    #[sqlx(rename = "fecha_egreso")]
    pub exit_date: Option<NaiveDate>,
    #[serde(rename = "motivo_egreso")]
    #[sqlx(rename = "motivo_egreso")]
    pub exit_reason: Option<ExitReason>,
    // true enquanto fecha_egreso for NULL
    #[serde(rename = "activo_en_finca")]
    #[sqlx(rename = "activo_en_finca")]
    pub active: bool,
}

impl InventoryRecord {
    /// O registro está ativo se e somente se não tem data de saída.
    pub fn is_consistent(&self) -> bool {
        self.active == self.exit_date.is_none()
    }
}

// --- 2. Animal ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SpeciesRef {
    #[serde(rename = "especie_id")]
    pub id: i32,
    #[serde(rename = "nombre_comun")]
    pub common_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BreedRef {
    #[serde(rename = "raza_id")]
    pub id: i32,
    #[serde(rename = "nombre_raza")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Animal {
    pub animal_id: i64,
    #[serde(rename = "numero_trazabilidad")]
    pub traceability_number: String,
    #[serde(rename = "nombre_identificatorio")]
    pub display_name: Option<String>,
    #[serde(rename = "especie")]
    pub species: SpeciesRef,
    #[serde(rename = "raza")]
    pub breed: BreedRef,
    #[serde(rename = "sexo")]
    pub sex: String,
    #[serde(rename = "fecha_nacimiento")]
    pub birth_date: Option<NaiveDate>,
}

// Linha "achatada" vinda do JOIN animal + especies + razas.
#[derive(Debug, FromRow)]
pub struct AnimalRow {
    pub animal_id: i64,
    pub numero_trazabilidad: String,
    pub nombre_identificatorio: Option<String>,
    pub especie_id: i32,
    pub nombre_comun: String,
    pub raza_id: i32,
    pub nombre_raza: String,
    pub sexo: String,
    pub fecha_nacimiento: Option<NaiveDate>,
}

impl From<AnimalRow> for Animal {
    fn from(row: AnimalRow) -> Self {
        Self {
            animal_id: row.animal_id,
            traceability_number: row.numero_trazabilidad,
            display_name: row.nombre_identificatorio,
            species: SpeciesRef {
                id: row.especie_id,
                common_name: row.nombre_comun,
            },
            breed: BreedRef {
                id: row.raza_id,
                name: row.nombre_raza,
            },
            sex: row.sexo,
            birth_date: row.fecha_nacimiento,
        }
    }
}

// --- 3. Controle sanitário (pesagem) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HealthCheckRecord {
    pub animal_id: i64,
    #[serde(rename = "fecha_control")]
    #[sqlx(rename = "fecha_control")]
    pub check_date: NaiveDate,
    #[serde(rename = "peso_kg")]
    #[sqlx(rename = "peso_kg")]
    pub weight_kg: Option<Decimal>,
    #[serde(rename = "condicion_corporal")]
    #[sqlx(rename = "condicion_corporal")]
    pub body_condition: Option<Decimal>,
}

// --- 4. Vacinação ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VaccinationRecord {
    #[serde(rename = "vacunacion_id")]
    #[sqlx(rename = "vacunacion_id")]
    pub id: i64,
    pub animal_id: i64,
    #[serde(rename = "tipo_vacuna_id")]
    #[sqlx(rename = "tipo_vacuna_id")]
    pub vaccine_type_id: i32,
    #[serde(rename = "fecha_aplicacion")]
    #[sqlx(rename = "fecha_aplicacion")]
    pub applied_on: NaiveDate,
    // Dias sugeridos até a próxima dose
    #[serde(rename = "proxima_vacunacion_sugerida")]
    #[sqlx(rename = "proxima_vacunacion_sugerida")]
    pub next_dose_in_days: Option<i32>,
}

impl VaccinationRecord {
    /// Data prevista da próxima dose (ausência de sugestão conta como 0 dias).
    pub fn projected_due_date(&self) -> NaiveDate {
        let days = i64::from(self.next_dose_in_days.unwrap_or(0));
        self.applied_on
            .checked_add_signed(chrono::Duration::days(days))
            .unwrap_or(self.applied_on)
    }
}

// --- 5. Alimentação ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FeedingRecord {
    pub animal_id: i64,
    #[serde(rename = "tipo_alimento_id")]
    #[sqlx(rename = "tipo_alimento_id")]
    pub feed_type_id: i32,
    #[serde(rename = "cantidad_suministrada")]
    #[sqlx(rename = "cantidad_suministrada")]
    pub quantity: Decimal,
}

// --- 6. Venda ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SaleRecord {
    #[serde(rename = "fecha_venta")]
    #[sqlx(rename = "fecha_venta")]
    pub sold_on: NaiveDate,
    #[serde(rename = "precio_venta_total_general")]
    #[sqlx(rename = "precio_venta_total_general")]
    pub total_price: Option<Decimal>,
    #[serde(rename = "lote_origen_id")]
    #[sqlx(rename = "lote_origen_id")]
    pub origin_lot_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(exit_date: Option<NaiveDate>, active: bool) -> InventoryRecord {
        InventoryRecord {
            id: 1,
            animal_id: 1,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            entry_reason: EntryReason::Birth,
            location_id: None,
            lot_id: None,
            exit_date,
            exit_reason: exit_date.map(|_| ExitReason::Sale),
            active,
        }
    }

    #[test]
    fn active_flag_matches_missing_exit_date() {
        let exit = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert!(record(None, true).is_consistent());
        assert!(record(exit, false).is_consistent());
        assert!(!record(None, false).is_consistent());
        assert!(!record(exit, true).is_consistent());
    }

    #[test]
    fn inventory_record_reads_farm_api_json() {
        let json = r#"{
            "inventario_id": 7,
            "animal_id": 3,
            "fecha_ingreso": "2024-02-10",
            "motivo_ingreso": "Compra",
            "ubicacion_actual_id": 2,
            "lote_actual_id": null,
            "fecha_egreso": null,
            "motivo_egreso": null,
            "activo_en_finca": true
        }"#;
        let parsed: InventoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, 7);
        assert_eq!(parsed.entry_reason, EntryReason::Purchase);
        assert_eq!(parsed.location_id, Some(2));
        assert!(parsed.is_consistent());
    }

    #[test]
    fn projected_due_date_treats_missing_days_as_zero() {
        let applied_on = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut vaccination = VaccinationRecord {
            id: 1,
            animal_id: 1,
            vaccine_type_id: 4,
            applied_on,
            next_dose_in_days: None,
        };
        assert_eq!(vaccination.projected_due_date(), applied_on);

        vaccination.next_dose_in_days = Some(30);
        assert_eq!(
            vaccination.projected_due_date(),
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()
        );
    }
}
