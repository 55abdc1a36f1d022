#![allow(missing_docs)]
//! Host-level tests for coordinate mapping and segment layout.

use std::collections::HashSet;

use arena_envoy::mapping::{pixel_index, pixel_xy};
use arena_envoy::topology::Owner;
use arena_envoy::{ArenaConfig, Edges, Error, Grid, Mode, Topology};
use proptest::prelude::*;

#[test]
fn serpentine_index_is_a_bijection() {
    let config = ArenaConfig::default();
    let (width, height) = (config.panel_width * config.segment_count, config.height);
    assert_eq!((width, height), (128, 16));
    let indices: HashSet<usize> = (0..width)
        .flat_map(|x| (0..height).map(move |y| pixel_index(x, y, height)))
        .collect();
    assert_eq!(indices.len(), width * height);
    assert!(indices.iter().all(|&index| index < width * height));
}

#[test]
fn serpentine_index_examples() {
    assert_eq!(pixel_index(0, 3, 16), 3);
    assert_eq!(pixel_index(1, 0, 16), 31);
    assert_eq!(pixel_index(15, 12, 16), 243);
    assert_eq!(pixel_xy(243, 16), (15, 12));
}

#[test]
fn grid_index_matches_serpentine_order() {
    let grid = Grid::new(128, 16);
    assert_eq!(grid.index(1, 0, Edges::Strict), Ok(31));
    assert_eq!(grid.index(-1, 0, Edges::Toroidal), Ok(pixel_index(127, 0, 16)));
}

#[test]
fn strict_rejects_out_of_range() {
    let grid = Grid::new(128, 16);
    assert_eq!(
        grid.resolve(128, 0, Edges::Strict),
        Err(Error::OutOfBounds {
            x: 128,
            y: 0,
            width: 128,
            height: 16
        })
    );
    assert!(grid.resolve(0, -1, Edges::Strict).is_err());
}

#[test]
fn wrap_examples() {
    let grid = Grid::new(128, 16);
    assert_eq!(grid.wrap(-1, 0), (127, 0));
    assert_eq!(grid.wrap(130, 17), (2, 1));
    assert_eq!(grid.wrap(-129, -33), (127, 15));
}

#[test]
fn independent_columns_partition_the_arena() {
    let topology = Topology::new(Mode::Independent, &ArenaConfig::default()).expect("valid config");
    assert_eq!(topology.width(), 128);
    assert_eq!(topology.locate(20), Some((1, 4)));
    assert_eq!(topology.locate(127), Some((7, 15)));

    let mut covered = vec![0_usize; topology.width()];
    for segment in 0..topology.segment_count() {
        for x in topology.segment_columns(segment) {
            covered[x] += 1;
        }
    }
    assert!(covered.iter().all(|&count| count == 1));
}

#[test]
fn duplicate_and_single_chain_layouts() {
    let config = ArenaConfig::default();
    let duplicate = Topology::new(Mode::Duplicate, &config).expect("valid config");
    assert_eq!((duplicate.width(), duplicate.height()), (16, 16));
    assert_eq!(duplicate.segment_count(), 8);
    assert_eq!(duplicate.owner(3), Owner::Every);
    assert!(duplicate.is_mirrored());

    let single = Topology::new(Mode::SingleChain, &config).expect("valid config");
    assert_eq!(single.width(), 128);
    assert_eq!(single.segment_count(), 1);
    assert_eq!(single.pixels_per_segment(), 2048);

    let text = Topology::new(Mode::Diagnostic, &config).expect("valid config");
    assert_eq!(text.width(), 128);
    assert_eq!(text.segment_count(), 0);
    assert_eq!(text.owner(0), Owner::Nobody);
}

proptest! {
    #[test]
    fn wrapping_by_whole_turns_is_invisible(
        x in -1000_i32..1000,
        y in -1000_i32..1000,
        turns_x in -5_i32..5,
        turns_y in -5_i32..5,
    ) {
        let grid = Grid::new(128, 16);
        prop_assert_eq!(grid.wrap(x, y), grid.wrap(x + turns_x * 128, y + turns_y * 16));
        let (wx, wy) = grid.wrap(x, y);
        prop_assert!(wx < 128 && wy < 16);

        let index = grid.index(x, y, Edges::Toroidal);
        prop_assert_eq!(grid.index(x, y, Edges::Toroidal), grid.index(x + turns_x * 128, y + turns_y * 16, Edges::Toroidal));
        let floored = (usize::try_from(x.rem_euclid(128)).unwrap(), usize::try_from(y.rem_euclid(16)).unwrap());
        prop_assert_eq!(index, Ok(pixel_index(floored.0, floored.1, 16)));
    }

    #[test]
    fn serpentine_index_is_a_bijection_for_any_grid(width in 1_usize..40, height in 1_usize..40) {
        let indices: HashSet<usize> = (0..width)
            .flat_map(|x| (0..height).map(move |y| pixel_index(x, y, height)))
            .collect();
        prop_assert_eq!(indices.len(), width * height);
        prop_assert!(indices.iter().all(|&index| index < width * height));
    }

    #[test]
    fn pixel_xy_inverts_pixel_index(x in 0_usize..64, y in 0_usize..16) {
        prop_assert_eq!(pixel_xy(pixel_index(x, y, 16), 16), (x, y));
    }
}
