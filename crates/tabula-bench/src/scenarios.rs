//! Reference models used by the bench runner and the `write` command.

use tabula_core::{Bounds, Domain, Model, ModelError, VariableHandle};
use tabula_expr::{CoefficientTable, IndexSet, IndexValue};

const FOODS: [&str; 9] = [
    "hamburger",
    "chicken",
    "hot_dog",
    "fries",
    "macaroni",
    "pizza",
    "salad",
    "milk",
    "ice_cream",
];
const PRICES: [f64; 9] = [2.49, 2.89, 1.50, 1.89, 2.09, 1.99, 2.49, 0.89, 1.59];
const NUTRIENTS: [&str; 4] = ["calories", "protein", "fat", "sodium"];
const NUTRITION: [[f64; 4]; 9] = [
    [410.0, 24.0, 26.0, 730.0],
    [420.0, 32.0, 10.0, 1190.0],
    [560.0, 20.0, 32.0, 1800.0],
    [380.0, 4.0, 19.0, 270.0],
    [320.0, 12.0, 10.0, 930.0],
    [320.0, 15.0, 12.0, 820.0],
    [320.0, 31.0, 12.0, 1230.0],
    [100.0, 8.0, 2.5, 125.0],
    [330.0, 8.0, 10.0, 180.0],
];

/// The classic nine-food diet problem, finalized.
pub fn diet_model() -> Result<Model, ModelError> {
    let mut model = Model::new();
    let buy = model.add_variables(
        "Buy",
        &IndexSet::new("food", FOODS),
        Bounds::default(),
        Domain::Continuous,
    )?;

    let prices = CoefficientTable::from_pairs("food", FOODS.into_iter().zip(PRICES));
    let mut rows = Vec::with_capacity(FOODS.len() * NUTRIENTS.len());
    for (food, amounts) in FOODS.iter().zip(NUTRITION) {
        for (nutrient, amount) in NUTRIENTS.iter().zip(amounts) {
            rows.push((vec![IndexValue::from(*food), IndexValue::from(*nutrient)], amount));
        }
    }
    let nutrition = CoefficientTable::from_rows(["food", "nutrient"], rows)?;
    let min_nutrients =
        CoefficientTable::from_pairs("nutrient", [("calories", 1800.0), ("protein", 91.0)]);
    let max_nutrients = CoefficientTable::from_pairs(
        "nutrient",
        [("calories", 2200.0), ("fat", 65.0), ("sodium", 1779.0)],
    );

    model.minimize(buy.expr().mul(&prices)?.sum())?;

    let intake = buy.expr().mul(&nutrition)?.sum_over(["food"])?;
    let lower = min_nutrients
        .to_expression()?
        .le(intake.within(&min_nutrients.index_set()?)?)?;
    model.add_constraint("min_nutrients", lower)?;
    let upper = intake
        .within(&max_nutrients.index_set()?)?
        .le(&max_nutrients)?;
    model.add_constraint("max_nutrients", upper)?;

    model.finalize()?;
    Ok(model)
}

/// Capacitated facility location data over facilities `i` and customers `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityData {
    pub capacity: Vec<f64>,
    pub fixed_cost: Vec<f64>,
    pub demand: Vec<f64>,
    /// `unit_cost[i][j]`
    pub unit_cost: Vec<Vec<f64>>,
}

impl FacilityData {
    /// Deterministic synthetic instance; the same sizes always give the same data.
    pub fn generate(facilities: usize, customers: usize) -> Self {
        let capacity = (0..facilities).map(|i| 50.0 + 10.0 * (i % 7) as f64).collect();
        let fixed_cost = (0..facilities).map(|i| 500.0 + 25.0 * (i % 11) as f64).collect();
        let demand = (0..customers).map(|j| 5.0 + (j % 5) as f64).collect();
        let unit_cost = (0..facilities)
            .map(|i| {
                (0..customers)
                    .map(|j| 1.0 + 0.5 * ((i * 7 + j * 3) % 13) as f64)
                    .collect()
            })
            .collect();
        Self {
            capacity,
            fixed_cost,
            demand,
            unit_cost,
        }
    }

    pub fn facilities(&self) -> usize {
        self.capacity.len()
    }

    pub fn customers(&self) -> usize {
        self.demand.len()
    }
}

fn indexed(values: &[f64]) -> impl Iterator<Item = (i64, f64)> + '_ {
    values.iter().copied().enumerate().map(|(k, v)| (k as i64, v))
}

/// A facility model under construction, split into the stages the bench times.
pub struct FacilityModel {
    model: Model,
    open: VariableHandle,
    transport: VariableHandle,
    capacity: CoefficientTable,
    fixed_cost: CoefficientTable,
    demand: CoefficientTable,
    unit_cost: CoefficientTable,
}

impl FacilityModel {
    /// Declare `open[i]` (binary) and `transport[i,j]` and load the data tables.
    pub fn declare(data: &FacilityData) -> Result<Self, ModelError> {
        let facilities = IndexSet::new("i", 0..data.facilities() as i64);
        let customers = IndexSet::new("j", 0..data.customers() as i64);
        let routes = IndexSet::product(&[facilities.clone(), customers])?;

        let mut model = Model::new();
        let open = model.add_binary("open", &facilities)?;
        let transport =
            model.add_variables("transport", &routes, Bounds::default(), Domain::Continuous)?;

        let mut cost_rows = Vec::with_capacity(data.facilities() * data.customers());
        for (i, row) in data.unit_cost.iter().enumerate() {
            for (j, cost) in row.iter().enumerate() {
                cost_rows.push((vec![IndexValue::from(i as i64), IndexValue::from(j as i64)], *cost));
            }
        }

        Ok(Self {
            model,
            open,
            transport,
            capacity: CoefficientTable::from_pairs("i", indexed(&data.capacity)),
            fixed_cost: CoefficientTable::from_pairs("i", indexed(&data.fixed_cost)),
            demand: CoefficientTable::from_pairs("j", indexed(&data.demand)),
            unit_cost: CoefficientTable::from_rows(["i", "j"], cost_rows)?,
        })
    }

    /// `capacity[i]: sum_j transport[i,j] - capacity[i] open[i] <= 0` and
    /// `demand[j]: sum_i transport[i,j] = demand[j]`.
    pub fn add_constraints(&mut self) -> Result<(), ModelError> {
        let shipped = self.transport.expr().sum_over(["j"])?;
        let capacity = shipped
            .sub(self.open.expr().mul(&self.capacity)?)?
            .le(0.0)?;
        self.model.add_constraint("capacity", capacity)?;

        let received = self.transport.expr().sum_over(["i"])?;
        self.model
            .add_constraint("demand", received.equals(&self.demand)?)?;
        Ok(())
    }

    pub fn set_objective(&mut self) -> Result<(), ModelError> {
        let objective = self
            .open
            .expr()
            .mul(&self.fixed_cost)?
            .sum()
            .add(self.transport.expr().mul(&self.unit_cost)?.sum())?;
        self.model.minimize(objective)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }
}

/// Build and finalize a facility model in one go.
pub fn facility_model(data: &FacilityData) -> Result<Model, ModelError> {
    let mut build = FacilityModel::declare(data)?;
    build.add_constraints()?;
    build.set_objective()?;
    build.model_mut().finalize()?;
    Ok(build.into_model())
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use tabula_core::WriteOptions;

    use super::{FacilityData, diet_model, facility_model};

    #[test]
    fn generated_data_is_deterministic() {
        let first = FacilityData::generate(4, 6);
        assert_eq!(first, FacilityData::generate(4, 6));
        assert_eq!(first.facilities(), 4);
        assert_eq!(first.customers(), 6);
        assert_eq!(first.unit_cost[1][2], 1.0);
    }

    #[test]
    fn facility_model_counts_follow_sizes() {
        let model = facility_model(&FacilityData::generate(3, 5)).unwrap();
        assert_eq!(model.num_variables(), 3 + 15);
        assert_eq!(model.num_constraints(), 3 + 5);
        // capacity rows carry 5 transports + open, demand rows 3 transports
        assert_eq!(model.num_coefficients(), 3 * 6 + 5 * 3);
    }

    #[test]
    fn diet_model_has_two_constraint_families() {
        let model = diet_model().unwrap();
        assert_eq!(model.num_variables(), 9);
        assert_eq!(model.num_constraints(), 5);
        let text = model.to_lp_string(&WriteOptions::default()).unwrap();
        assert!(text.contains("max_nutrients[fat]: +26 Buy[hamburger]"));
    }
}
