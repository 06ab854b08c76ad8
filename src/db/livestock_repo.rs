// src/db/livestock_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::livestock::{
        Animal, AnimalRow, FeedingRecord, HealthCheckRecord, InventoryRecord, SaleRecord,
        VaccinationRecord,
    },
    services::dashboard_service::LivestockSource,
};

// O repositório de leitura das seis coleções usadas pelo painel.
#[derive(Clone)]
pub struct LivestockRepository {
    pool: PgPool,
}

impl LivestockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LivestockSource for LivestockRepository {
    async fn inventory(&self) -> Result<Vec<InventoryRecord>, AppError> {
        let rows = sqlx::query_as::<_, InventoryRecord>(
            r#"
            SELECT inventario_id, animal_id, fecha_ingreso, motivo_ingreso,
                   ubicacion_actual_id, lote_actual_id, fecha_egreso, motivo_egreso,
                   activo_en_finca
            FROM inventario_animal
            ORDER BY inventario_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let inconsistent = rows.iter().filter(|r| !r.is_consistent()).count();
        if inconsistent > 0 {
            tracing::warn!(
                "⚠️ {} registros de inventário com activo_en_finca divergente de fecha_egreso",
                inconsistent
            );
        }
        Ok(rows)
    }

    // Espécie e raça vêm "achatadas" do JOIN e são aninhadas no From<AnimalRow>.
    async fn animals(&self) -> Result<Vec<Animal>, AppError> {
        let rows = sqlx::query_as::<_, AnimalRow>(
            r#"
            SELECT a.animal_id, a.numero_trazabilidad, a.nombre_identificatorio,
                   e.especie_id, e.nombre_comun,
                   r.raza_id, r.nombre_raza,
                   a.sexo, a.fecha_nacimiento
            FROM animal a
            JOIN especies e ON e.especie_id = a.especie_id
            JOIN razas r ON r.raza_id = a.raza_id
            ORDER BY a.animal_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Animal::from).collect())
    }

    async fn health_checks(&self) -> Result<Vec<HealthCheckRecord>, AppError> {
        let rows = sqlx::query_as::<_, HealthCheckRecord>(
            r#"
            SELECT animal_id, fecha_control, peso_kg, condicion_corporal
            FROM controles_sanitarios
            ORDER BY control_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn vaccinations(&self) -> Result<Vec<VaccinationRecord>, AppError> {
        let rows = sqlx::query_as::<_, VaccinationRecord>(
            r#"
            SELECT vacunacion_id, animal_id, tipo_vacuna_id, fecha_aplicacion,
                   proxima_vacunacion_sugerida
            FROM vacunaciones
            ORDER BY vacunacion_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Alimentações por lote/localização (sem animal) não entram no painel.
    async fn feedings(&self) -> Result<Vec<FeedingRecord>, AppError> {
        let rows = sqlx::query_as::<_, FeedingRecord>(
            r#"
            SELECT animal_id, tipo_alimento_id, cantidad_suministrada
            FROM alimentaciones
            WHERE animal_id IS NOT NULL
            ORDER BY alimentacion_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn sales(&self) -> Result<Vec<SaleRecord>, AppError> {
        let rows = sqlx::query_as::<_, SaleRecord>(
            r#"
            SELECT fecha_venta, precio_venta_total_general, lote_origen_id
            FROM ventas
            ORDER BY venta_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
