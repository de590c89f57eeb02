//! Column expressions over a cluster frame
//!
//! Every builder casts its inputs to `Float64` before doing arithmetic, so the
//! unsigned aggregate columns never wrap (`n - 1` on an empty cluster).

use crate::error::{MetricError, MetricResult};
use crate::frame::columns;
use polars::prelude::*;

fn float_col(name: &str) -> Expr {
    col(name).cast(DataType::Float64)
}

/// Sum of member degrees, `2m + c`
pub fn vol() -> Expr {
    (float_col(columns::M) * lit(2.0) + float_col(columns::C)).alias("vol")
}

/// Constant Potts model score, `m - r * n (n - 1) / 2`
pub fn cpm(resolution: f64) -> Expr {
    let n = float_col(columns::N);
    let pairs = n.clone() * (n - lit(1.0)) / lit(2.0);
    (float_col(columns::M) - lit(resolution) * pairs).alias("cpm")
}

/// Modularity, `m / L - r * (vol / 2L)^2` where `L` is the graph's edge count
pub fn modularity(total_edges: u64, resolution: f64) -> MetricResult<Expr> {
    if total_edges == 0 {
        return Err(MetricError::DegenerateGraph);
    }
    let big_l = total_edges as f64;
    let expected = vol() / lit(2.0 * big_l);
    Ok((float_col(columns::M) / lit(big_l) - lit(resolution) * expected.clone() * expected)
        .alias("modularity"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            columns::N => [0u64, 1, 3, 4],
            columns::M => [0u64, 0, 3, 3],
            columns::C => [0u64, 2, 1, 0]
        )
        .unwrap()
    }

    fn values(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn test_cpm_expression() {
        let out = frame().lazy().select([cpm(0.5)]).collect().unwrap();
        assert_eq!(values(&out, "cpm"), vec![0.0, 0.0, 1.5, 0.0]);
    }

    #[test]
    fn test_vol_expression() {
        let out = frame().lazy().select([vol()]).collect().unwrap();
        assert_eq!(values(&out, "vol"), vec![0.0, 2.0, 7.0, 6.0]);
    }

    #[test]
    fn test_modularity_expression() {
        let out = frame()
            .lazy()
            .select([modularity(3, 1.0).unwrap()])
            .collect()
            .unwrap();
        let q = values(&out, "modularity");
        // last row is the whole graph: 3/3 - (6/6)^2
        assert!(q[3].abs() < 1e-12);
        assert!((q[1] + (2.0f64 / 6.0).powi(2)).abs() < 1e-12);
    }

    #[test]
    fn test_expressions_compose() {
        let out = frame()
            .lazy()
            .select([(float_col(columns::M) / lit(3.0)).alias("coverage"), cpm(1.0)])
            .collect()
            .unwrap();
        assert_eq!(values(&out, "coverage")[2], 1.0);
        assert_eq!(values(&out, "cpm")[2], 0.0);
    }

    #[test]
    fn test_modularity_requires_edges() {
        assert!(matches!(modularity(0, 1.0), Err(MetricError::DegenerateGraph)));
    }
}
