use anyhow::Result;
use sqlx::Row;

use crate::domain::fms::{BreedCount, ChickInfo, Dashboard, HatcherySummary};
use crate::infra::db::Db;

const RECENT_CHICKS_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct FmsService {
    db: Db,
}

impl FmsService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn dashboard(&self) -> Result<Dashboard> {
        let mut conn = self.db.pool().acquire().await?;

        let row = sqlx::query(
            "SELECT count(*) AS total, avg(egg_weight) AS avg_weight FROM fms.chick_info",
        )
        .fetch_one(&mut *conn)
        .await?;
        let summary = HatcherySummary {
            total: row.get("total"),
            avg_weight: row.get("avg_weight"),
        };

        let rows = sqlx::query(
            "SELECT breeds, count(*) AS count \
             FROM fms.chick_info \
             GROUP BY breeds \
             ORDER BY breeds",
        )
        .fetch_all(&mut *conn)
        .await?;
        let breed_stats = rows
            .into_iter()
            .map(|row| BreedCount {
                breeds: row.get("breeds"),
                count: row.get("count"),
            })
            .collect();

        let rows = sqlx::query(
            "SELECT id, chick_no, breeds, gender, hatchday, egg_weight, farm \
             FROM fms.chick_info \
             ORDER BY hatchday DESC \
             LIMIT $1",
        )
        .bind(RECENT_CHICKS_LIMIT)
        .fetch_all(&mut *conn)
        .await?;
        let recent_chicks = rows
            .into_iter()
            .map(|row| ChickInfo {
                id: row.get("id"),
                chick_no: row.get("chick_no"),
                breeds: row.get("breeds"),
                gender: row.get("gender"),
                hatchday: row.get("hatchday"),
                egg_weight: row.get("egg_weight"),
                farm: row.get("farm"),
            })
            .collect();

        Ok(Dashboard {
            summary,
            breed_stats,
            recent_chicks,
        })
    }
}
