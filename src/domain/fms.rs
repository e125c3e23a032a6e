use time::Date;

#[derive(Debug, Clone)]
pub struct ChickInfo {
    pub id: i64,
    pub chick_no: String,
    pub breeds: String,
    pub gender: Option<String>,
    pub hatchday: Date,
    pub egg_weight: Option<f64>,
    pub farm: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HatcherySummary {
    pub total: i64,
    pub avg_weight: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct BreedCount {
    pub breeds: String,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub summary: HatcherySummary,
    pub breed_stats: Vec<BreedCount>,
    pub recent_chicks: Vec<ChickInfo>,
}
