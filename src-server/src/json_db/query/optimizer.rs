// FICHIER : src-server/src/json_db/query/optimizer.rs

//! Optimiseur de requêtes : ne change jamais le résultat, seulement le coût.

use super::{ComparisonOperator, Condition, FilterOperator, Query, QueryFilter};

/// Plafond de taille de page accepté par le moteur.
pub const MAX_LIMIT: usize = 10_000;

#[derive(Debug, Default)]
pub struct QueryOptimizer {
    config: OptimizerConfig,
}

#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub reorder_conditions: bool,
    pub simplify_filters: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            reorder_conditions: true,
            simplify_filters: true,
        }
    }
}

impl QueryOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn optimize(&self, mut query: Query) -> Query {
        if let Some(filter) = query.filter.take() {
            let mut filter = filter;
            if self.config.simplify_filters {
                filter = self.simplify_filter(filter);
            }
            if self.config.reorder_conditions {
                filter = self.reorder_conditions(filter);
            }
            // Un AND vide accepte tout : inutile de l'évaluer
            if !(filter.operator == FilterOperator::And && filter.conditions.is_empty()) {
                query.filter = Some(filter);
            }
        }

        if let Some(limit) = query.limit {
            query.limit = Some(limit.min(MAX_LIMIT));
        }
        query
    }

    fn simplify_filter(&self, mut filter: QueryFilter) -> QueryFilter {
        filter.conditions = self.deduplicate_conditions(&filter.conditions);
        filter
    }

    fn reorder_conditions(&self, mut filter: QueryFilter) -> QueryFilter {
        // Tri stable : à coût égal, l'ordre d'origine est conservé
        filter
            .conditions
            .sort_by_key(|cond| self.estimate_selectivity(cond));
        filter
    }

    /// Coût estimé d'une condition. Plus le score est bas, plus elle est
    /// restrictive et rapide à vérifier.
    fn estimate_selectivity(&self, condition: &Condition) -> u32 {
        match condition.operator {
            ComparisonOperator::Eq => 1,
            ComparisonOperator::In => 2,

            ComparisonOperator::Gt
            | ComparisonOperator::Gte
            | ComparisonOperator::Lt
            | ComparisonOperator::Lte => 10,

            ComparisonOperator::StartsWith | ComparisonOperator::EndsWith => 20,
            ComparisonOperator::Contains => 50,

            // Décodage et test géométrique par document
            ComparisonOperator::GeoIntersects => 80,

            ComparisonOperator::Ne => 100,
        }
    }

    fn deduplicate_conditions(&self, conditions: &[Condition]) -> Vec<Condition> {
        let mut unique: Vec<Condition> = Vec::with_capacity(conditions.len());
        for condition in conditions {
            if !unique.contains(condition) {
                unique.push(condition.clone());
            }
        }
        unique
    }
}

// ============================================================================
// TESTS UNITAIRES
// ============================================================================
