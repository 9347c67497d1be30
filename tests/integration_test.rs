//! End-to-end tests for `multi_groupby` and `multi_dim_apply`

use assemblies::prelude::*;
use ndarray::{array, ArrayD};

const GREEK: [&str; 7] = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta"];
const COLORS: [&str; 6] = ["red", "green", "blue", "purple", "yellow", "orange"];
const COMPASS: [&str; 8] = [
    "north",
    "south",
    "east",
    "west",
    "northeast",
    "southeast",
    "southwest",
    "northwest",
];

/// `x` rows of `y` consecutive integers, with two coordinates per dimension
fn generated(x: usize, y: usize) -> Result<LabeledArray> {
    let data = ArrayD::from_shape_fn(vec![x, y], |idx| (idx[0] * y + idx[1]) as f64);
    LabeledArray::builder(data)
        .dims(["a", "b"])
        .coord_on("greek", "a", GREEK[..x].iter().copied())
        .coord_on("colors", "a", COLORS[..x].iter().copied())
        .coord_on("compass", "b", COMPASS[..y].iter().copied())
        .coord_on("integer", "b", (0..y as i64).collect::<Vec<_>>())
        .build()
}

fn identity(x: &LabeledArray, _: &ApplyOptions) -> Result<ArrayD<f64>> {
    Ok(x.data().clone())
}

fn four_by_three() -> Result<LabeledArray> {
    LabeledArray::builder(array![[1, 2, 3], [4, 5, 6], [7, 8, 9], [10, 11, 12]])
        .dims(["a", "b"])
        .coord("a", ["a", "b", "c", "d"])
        .coord("b", ["x", "y", "z"])
        .build()
}

fn six_by_three() -> Result<LabeledArray> {
    LabeledArray::builder(array![
        [1, 2, 3],
        [4, 5, 6],
        [7, 8, 9],
        [10, 11, 12],
        [13, 14, 15],
        [16, 17, 18]
    ])
    .dims(["a", "b"])
    .coord_on("up", "a", ["alpha", "alpha", "beta", "beta", "beta", "beta"])
    .coord_on("down", "a", [1, 1, 1, 1, 2, 2])
    .coord_on("sideways", "b", ["x", "y", "z"])
    .build()
}

mod multi_groupby {
    use super::*;

    #[test]
    fn test_single_dimension() -> Result<()> {
        let d = LabeledArray::builder(array![[1, 2, 3], [4, 5, 6]])
            .dims(["a", "b"])
            .coord("a", ["a", "b"])
            .coord("b", ["x", "y", "z"])
            .build()?;
        let g = d.multi_groupby(&["a"])?.mean(ReduceDims::All)?;
        let expected = LabeledArray::builder(array![2, 5])
            .dims(["a"])
            .coord("a", ["a", "b"])
            .build()?;
        assert!(g.equals(&expected), "{g:?}");
        Ok(())
    }

    #[test]
    fn test_single_dimension_int() -> Result<()> {
        let d = LabeledArray::builder(array![[1, 2, 3], [4, 5, 6]])
            .dims(["a", "b"])
            .coord("a", [1, 2])
            .coord("b", [3, 4, 5])
            .build()?;
        let g = d.multi_groupby(&["a"])?.mean(ReduceDims::All)?;
        let expected = LabeledArray::builder(array![2.0, 5.0])
            .dims(["a"])
            .coord("a", [1, 2])
            .build()?;
        assert!(g.equals(&expected), "{g:?}");
        Ok(())
    }

    #[test]
    fn test_single_coord() -> Result<()> {
        let d = generated(3, 7)?;
        let g = d.multi_groupby(&["greek"])?.mean(ReduceDims::All)?;
        // colors is constant within each greek partition, so it survives
        let expected = LabeledArray::builder(array![3, 10, 17])
            .dims(["a"])
            .coord_on("greek", "a", ["alpha", "beta", "gamma"])
            .coord_on("colors", "a", ["red", "green", "blue"])
            .build()?;
        assert!(g.equals(&expected), "{g:?}");
        Ok(())
    }

    #[test]
    fn test_single_dim_multi_coord() -> Result<()> {
        let d = LabeledArray::builder(array![1, 2, 3, 4, 5, 6])
            .dims(["multi_dim"])
            .coord_on("a", "multi_dim", ["a", "a", "a", "a", "a", "a"])
            .coord_on("b", "multi_dim", ["a", "a", "a", "b", "b", "b"])
            .coord_on("c", "multi_dim", ["a", "b", "c", "d", "e", "f"])
            .build()?;
        let g = d.multi_groupby(&["a", "b"])?.mean(ReduceDims::Grouped)?;
        let expected = LabeledArray::builder(array![2, 5])
            .dims(["multi_dim"])
            .coord_on("a", "multi_dim", ["a", "a"])
            .coord_on("b", "multi_dim", ["a", "b"])
            .build()?;
        assert!(g.equals(&expected), "{g:?}");
        Ok(())
    }

    #[test]
    fn test_int_multi_coord() -> Result<()> {
        let d = LabeledArray::builder(array![1, 2, 3, 4, 5, 6])
            .dims(["multi_dim"])
            .coord_on("a", "multi_dim", [1, 1, 1, 1, 1, 1])
            .coord_on("b", "multi_dim", ["a", "a", "a", "b", "b", "b"])
            .coord_on("c", "multi_dim", ["a", "b", "c", "d", "e", "f"])
            .build()?;
        let g = d.multi_groupby(&["a", "b"])?.mean(ReduceDims::default())?;
        let expected = LabeledArray::builder(array![2.0, 5.0])
            .dims(["multi_dim"])
            .coord_on("a", "multi_dim", [1, 1])
            .coord_on("b", "multi_dim", ["a", "b"])
            .build()?;
        assert!(g.equals(&expected), "{g:?}");
        Ok(())
    }

    #[test]
    fn test_two_coord() -> Result<()> {
        let assy = six_by_three()?;
        let grouped = assy.multi_groupby(&["up", "down"])?.mean("a")?;
        let expected = LabeledArray::builder(array![
            [2.5, 3.5, 4.5],
            [8.5, 9.5, 10.5],
            [14.5, 15.5, 16.5]
        ])
        .dims(["a", "b"])
        .coord_on("up", "a", ["alpha", "beta", "beta"])
        .coord_on("down", "a", [1, 1, 2])
        .coord_on("sideways", "b", ["x", "y", "z"])
        .build()?;
        assert!(grouped.equals(&expected), "{grouped:?}");
        Ok(())
    }

    #[test]
    fn test_two_coord_swapped_order() -> Result<()> {
        let assy = six_by_three()?;
        let straight = assy.multi_groupby(&["up", "down"])?.mean("a")?;
        let swapped = assy.multi_groupby(&["down", "up"])?.mean("a")?;
        assert!(straight.equals(&swapped));
        Ok(())
    }

    #[test]
    fn test_dimension_name_groups_all_coordinates() -> Result<()> {
        let assy = six_by_three()?;
        let by_dim = assy.multi_groupby(&["a"])?.mean("a")?;
        let by_coords = assy.multi_groupby(&["up", "down"])?.mean("a")?;
        assert!(by_dim.equals(&by_coords), "{by_dim:?}");
        assert_eq!(
            by_dim.data(),
            &array![[2.5, 3.5, 4.5], [8.5, 9.5, 10.5], [14.5, 15.5, 16.5]].into_dyn()
        );
        Ok(())
    }

    #[test]
    fn test_dimension_without_coordinates_groups_by_position() -> Result<()> {
        let d = LabeledArray::builder(array![[1, 2, 3], [4, 5, 6]])
            .dims(["a", "b"])
            .coord_on("row", "a", ["x", "x"])
            .build()?;
        let g = d.multi_groupby(&["b"])?.sum("b")?;
        assert!(g.equals(&d), "{g:?}");

        let centered = d.multi_dim_apply(
            &["b"],
            |x, _| Ok(x.data() - x.aggregate(Reduction::Mean)),
            &ApplyOptions::new(),
        )?;
        assert_eq!(
            centered.data(),
            &array![[-1.5, -1.5, -1.5], [1.5, 1.5, 1.5]].into_dyn()
        );
        Ok(())
    }

    #[test]
    fn test_two_dimensions_grouped() -> Result<()> {
        let assy = six_by_three()?
            .multi_dim_apply(&[] as &[&str], identity, &ApplyOptions::new())?;
        let by_up_and_side = assy.multi_groupby(&["up", "sideways"])?;
        assert_eq!(by_up_and_side.groups().len(), 2);

        let sums = by_up_and_side.sum(ReduceDims::Grouped)?;
        let expected = LabeledArray::builder(array![[5, 7, 9], [46, 50, 54]])
            .dims(["a", "b"])
            .coord_on("up", "a", ["alpha", "beta"])
            .coord_on("sideways", "b", ["x", "y", "z"])
            .build()?;
        assert!(sums.equals(&expected), "{sums:?}");
        Ok(())
    }

    #[test]
    fn test_reduce_orthogonal_dimension() -> Result<()> {
        let assy = six_by_three()?;
        let g = assy
            .multi_groupby(&["up"])?
            .reduce(Reduction::Max, ReduceDims::dims(["b"]))?;
        let expected = LabeledArray::builder(array![6, 18])
            .dims(["a"])
            .coord_on("up", "a", ["alpha", "beta"])
            .build()?;
        assert!(g.equals(&expected), "{g:?}");
        Ok(())
    }

    #[test]
    fn test_varying_coordinate_dropped() -> Result<()> {
        let assy = six_by_three()?;
        let g = assy.multi_groupby(&["up"])?.count("a")?;
        assert!(g.coord("up").is_ok());
        assert!(g.coord("down").is_err());
        assert_eq!(g.data(), &array![[2.0, 2.0, 2.0], [4.0, 4.0, 4.0]].into_dyn());
        Ok(())
    }

    #[test]
    fn test_remnant_and_attrs_survive() -> Result<()> {
        let d = LabeledArray::builder(array![[1, 2, 3], [4, 5, 6]])
            .dims(["a", "b"])
            .coord("a", ["a", "b"])
            .coord("b", ["x", "y", "z"])
            .scalar_coord("c", "remnant")
            .attr("source", "test")
            .build()?;
        let g = d.multi_groupby(&["a", "c"])?.median(ReduceDims::All)?;
        assert_eq!(g.coord("c")?, &Coordinate::Remnant("remnant".into()));
        assert_eq!(g.attrs()["source"], "test");
        assert_eq!(g.data(), &array![2.0, 5.0].into_dyn());
        Ok(())
    }

    #[test]
    fn test_no_coordinates_reduces_everything() -> Result<()> {
        let d = four_by_three()?;
        let g = d.multi_groupby(&[] as &[&str])?.mean(ReduceDims::Grouped)?;
        assert_eq!(g.ndim(), 0);
        assert_eq!(g.aggregate(Reduction::Sum), 6.5);
        Ok(())
    }

    #[test]
    fn test_unknown_coordinate() -> Result<()> {
        let d = four_by_three()?;
        assert!(matches!(
            d.multi_groupby(&["a", "missing"]),
            Err(AssemblyError::UnknownCoordinate { coord }) if coord == "missing"
        ));
        assert!(matches!(
            d.multi_groupby(&["a"])?.mean("missing"),
            Err(AssemblyError::DimensionNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_other_reductions() -> Result<()> {
        let d = six_by_three()?;
        let handle = d.multi_groupby(&["up", "down"])?;
        assert_eq!(
            handle.min("a")?.data(),
            &array![[1.0, 2.0, 3.0], [7.0, 8.0, 9.0], [13.0, 14.0, 15.0]].into_dyn()
        );
        assert_eq!(
            handle.std("a")?.data(),
            &ArrayD::from_elem(vec![3_usize, 3], 1.5)
        );
        assert_eq!(
            handle.var("a")?.data(),
            &ArrayD::from_elem(vec![3_usize, 3], 2.25)
        );
        let partitions: Vec<usize> = handle.partitions().map(|(_, p)| p.len()).collect();
        assert_eq!(partitions, vec![3]);
        Ok(())
    }
}

mod multi_dim_apply {
    use super::*;

    #[test]
    fn test_unique_values() -> Result<()> {
        let d = four_by_three()?;
        let g = d.multi_dim_apply(&["a", "b"], identity, &ApplyOptions::new())?;
        assert!(g.identical(&d));
        Ok(())
    }

    #[test]
    fn test_unique_values_swappeddims() -> Result<()> {
        let d = four_by_three()?;
        let g = d.multi_dim_apply(&["b", "a"], identity, &ApplyOptions::new())?;
        assert!(g.identical(&d));
        Ok(())
    }

    #[test]
    fn test_nonindex_coord() -> Result<()> {
        // `c` has no index values, as left behind by `.sel(c='remnant')`
        let d = LabeledArray::builder(array![[1, 2, 3], [4, 5, 6], [7, 8, 9], [10, 11, 12]])
            .dims(["a", "b"])
            .coord("a", ["a", "b", "c", "d"])
            .coord("b", ["x", "y", "z"])
            .scalar_coord("c", "remnant")
            .build()?;
        let g = d.multi_dim_apply(&["a", "b"], identity, &ApplyOptions::new())?;
        assert!(g.equals(&d));
        assert_eq!(g.coord("c")?, &Coordinate::Remnant("remnant".into()));
        Ok(())
    }

    #[test]
    fn test_subtract_mean() -> Result<()> {
        let d = LabeledArray::builder(array![[1, 2, 3], [4, 5, 6], [7, 8, 9], [10, 11, 12]])
            .dims(["a", "b"])
            .coord("a", ["a", "b", "c", "d"])
            .coord_on("aa", "a", ["a", "a", "b", "b"])
            .coord("b", ["x", "y", "z"])
            .build()?;
        let g = d.multi_dim_apply(
            &["aa", "b"],
            |x, _| Ok(x.data() - x.aggregate(Reduction::Mean)),
            &ApplyOptions::new(),
        )?;
        let expected = LabeledArray::builder(array![
            [-1.5, -1.5, -1.5],
            [1.5, 1.5, 1.5],
            [-1.5, -1.5, -1.5],
            [1.5, 1.5, 1.5]
        ])
        .dims(["a", "b"])
        .coord("a", ["a", "b", "c", "d"])
        .coord_on("aa", "a", ["a", "a", "b", "b"])
        .coord("b", ["x", "y", "z"])
        .build()?;
        assert!(g.equals(&expected), "{g:?}");
        Ok(())
    }

    #[test]
    fn test_multi_level() -> Result<()> {
        let d = six_by_three()?;
        let g = d.multi_dim_apply(&["a", "b"], identity, &ApplyOptions::new())?;
        assert!(g.equals(&d));
        Ok(())
    }

    #[test]
    fn test_interleaved_partitions_keep_original_order() -> Result<()> {
        let d = LabeledArray::builder(array![1, 2, 3, 4, 5, 6])
            .dims(["t"])
            .coord_on("cond", "t", ["on", "off", "on", "off", "on", "off"])
            .build()?;
        let g = d.multi_dim_apply(
            &["cond"],
            |x, _| Ok(x.data() - x.aggregate(Reduction::Mean)),
            &ApplyOptions::new(),
        )?;
        assert_eq!(
            g.data(),
            &array![-2.0, -2.0, 0.0, 0.0, 2.0, 2.0].into_dyn()
        );
        Ok(())
    }

    #[test]
    fn test_options_and_broadcast_result() -> Result<()> {
        let d = six_by_three()?;
        let options = ApplyOptions::new().with("offset", 0.5).with("label", "shift");
        assert_eq!(options.get_str("label"), Some("shift"));
        assert!(options.get_bool("label").is_none());
        assert!(ApplyOptions::new().is_empty());
        let keys: Vec<&str> = options.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["label", "offset"]);

        // A 0-d result fills the whole partition
        let g = d.multi_dim_apply(
            &["up"],
            |x, opts| {
                let offset = opts.get_f64("offset").unwrap_or(0.0);
                Ok(ArrayD::from_elem(ndarray::IxDyn(&[]), x.aggregate(Reduction::Min) + offset))
            },
            &options,
        )?;
        assert_eq!(g.shape(), d.shape());
        assert_eq!(g.data()[[0, 2]], 1.5);
        assert_eq!(g.data()[[5, 0]], 7.5);
        Ok(())
    }

    #[test]
    fn test_incompatible_shape() -> Result<()> {
        let d = four_by_three()?;
        let result = d.multi_dim_apply(
            &["a"],
            |_, _| Ok(ArrayD::zeros(vec![2_usize])),
            &ApplyOptions::new(),
        );
        match result {
            Err(AssemblyError::IncompatibleShape { expected, found }) => {
                assert_eq!(expected, vec![1, 3]);
                assert_eq!(found, vec![2]);
            }
            other => panic!("Expected IncompatibleShape error, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_function_error_propagates() -> Result<()> {
        let d = four_by_three()?;
        let result = d.multi_dim_apply(
            &["b"],
            |x, _| Ok(x.sel("b", "w")?.into_data()),
            &ApplyOptions::new(),
        );
        assert!(matches!(result, Err(AssemblyError::LabelNotFound { .. })));
        Ok(())
    }

    #[test]
    fn test_unknown_coordinate() -> Result<()> {
        let d = four_by_three()?;
        let result = d.multi_dim_apply(
            &["missing"],
            |_, _| -> Result<ArrayD<f64>> { panic!("must not run") },
            &ApplyOptions::new(),
        );
        assert!(matches!(
            result,
            Err(AssemblyError::UnknownCoordinate { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_runs_inside_configured_pool() -> Result<()> {
        let d = generated(6, 8)?;
        let config = ParallelConfig::with_threads(2);
        let g = config.install(|| {
            d.multi_dim_apply(&["colors", "compass"], identity, &ApplyOptions::new())
        })??;
        assert!(g.identical(&d));
        Ok(())
    }
}
