use dorf_core::{CellCoord, CellKind, TerrainView};
use dorf_system_pathfinding::{GridSearch, Heuristic, Traversal};
use proptest::prelude::*;

/// Parses a picture of the terrain: `#` wall, `T` tree, `.` open ground.
fn terrain_from_rows(rows: &[&str]) -> (Vec<CellKind>, u32, u32) {
    let height = u32::try_from(rows.len()).expect("row count fits u32");
    let width = u32::try_from(rows[0].len()).expect("column count fits u32");
    let cells = rows
        .iter()
        .flat_map(|row| row.chars())
        .map(|glyph| match glyph {
            '#' => CellKind::Indestructible,
            'T' => CellKind::Tree,
            '.' => CellKind::Empty,
            other => panic!("unexpected glyph {other:?}"),
        })
        .collect();
    (cells, width, height)
}

fn walled_square(size: u32) -> (Vec<CellKind>, u32, u32) {
    let mut cells = Vec::new();
    for row in 0..size {
        for column in 0..size {
            let border = row == 0 || column == 0 || row + 1 == size || column + 1 == size;
            cells.push(if border {
                CellKind::Indestructible
            } else {
                CellKind::Empty
            });
        }
    }
    (cells, size, size)
}

fn assert_well_formed(cells: &[CellCoord], start: CellCoord, goal: CellCoord) {
    assert_eq!(cells.first(), Some(&start));
    assert_eq!(cells.last(), Some(&goal));
    for pair in cells.windows(2) {
        assert!(
            pair[0].is_adjacent(pair[1]),
            "{} and {} are not adjacent",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn start_equal_to_goal_yields_single_cell() {
    let (cells, width, height) = walled_square(10);
    let search = GridSearch::new(TerrainView::new(&cells, width, height));
    let start = CellCoord::new(4, 4);

    let path = search.solve(start, start).expect("trivial route");

    assert_eq!(path.cells(), &[start]);
    assert_eq!(path.cost(), 0);
}

#[test]
fn diagonal_neighbor_takes_one_step() {
    let (cells, width, height) = walled_square(10);
    let search = GridSearch::new(TerrainView::new(&cells, width, height));

    let path = search
        .solve(CellCoord::new(1, 1), CellCoord::new(2, 2))
        .expect("route exists");

    assert_eq!(path.len(), 2);
}

#[test]
fn long_diagonal_is_walked_cell_by_cell() {
    let (cells, width, height) = walled_square(10);
    let search = GridSearch::new(TerrainView::new(&cells, width, height));
    let start = CellCoord::new(1, 1);
    let goal = CellCoord::new(5, 5);

    let path = search.solve(start, goal).expect("route exists");

    assert_eq!(path.len(), 5);
    assert_well_formed(path.cells(), start, goal);
}

#[test]
fn uniform_traversal_walks_straight_through_trees() {
    let (cells, width, height) = terrain_from_rows(&[
        "#######", //
        "#..T..#", //
        "#..T..#", //
        "#.....#", //
        "#######",
    ]);
    let search = GridSearch::new(TerrainView::new(&cells, width, height));

    let path = search
        .solve(CellCoord::new(1, 1), CellCoord::new(5, 1))
        .expect("route exists");

    assert_eq!(path.len(), 5);
    assert!(path.cells().contains(&CellCoord::new(3, 1)));
}

#[test]
fn terrain_aware_traversal_detours_around_trees() {
    let (cells, width, height) = terrain_from_rows(&[
        "#######", //
        "#..T..#", //
        "#..T..#", //
        "#.....#", //
        "#######",
    ]);
    let view = TerrainView::new(&cells, width, height);
    let search = GridSearch::new(view).with_traversal(Traversal::TerrainAware);
    let start = CellCoord::new(1, 1);
    let goal = CellCoord::new(5, 1);

    let path = search.solve(start, goal).expect("detour exists");

    assert_well_formed(path.cells(), start, goal);
    assert!(path.cells()[1..]
        .iter()
        .all(|cell| view.cost_of(*cell).is_some()));
    assert!(path.cells().contains(&CellCoord::new(3, 3)));
}

#[test]
fn enclosed_goal_reports_no_route() {
    let (cells, width, height) = terrain_from_rows(&[
        "#######", //
        "#.....#", //
        "#..TTT#", //
        "#..T..#", //
        "#..T..#", //
        "#######",
    ]);
    let search = GridSearch::new(TerrainView::new(&cells, width, height))
        .with_traversal(Traversal::TerrainAware);

    assert!(search
        .solve(CellCoord::new(1, 1), CellCoord::new(4, 3))
        .is_none());
}

#[test]
fn goal_outside_terrain_reports_no_route() {
    let (cells, width, height) = walled_square(10);
    let search = GridSearch::new(TerrainView::new(&cells, width, height));

    assert!(search
        .solve(CellCoord::new(1, 1), CellCoord::new(12, 3))
        .is_none());
}

#[test]
fn neighbor_counts_match_grid_position() {
    let (cells, width, height) = walled_square(10);
    let search = GridSearch::new(TerrainView::new(&cells, width, height));
    let count = |column, row| search.neighbors(CellCoord::new(column, row)).count();

    assert_eq!(count(5, 5), 8);
    assert_eq!(count(0, 0), 3);
    assert_eq!(count(0, 1), 5);
    assert_eq!(count(0, 9), 3);
    assert_eq!(count(9, 0), 3);
    assert_eq!(count(9, 9), 3);
    assert_eq!(count(1, 9), 5);
    assert_eq!(count(9, 1), 5);
}

#[test]
fn repeated_searches_return_identical_routes() {
    let (cells, width, height) = walled_square(16);
    let search = GridSearch::new(TerrainView::new(&cells, width, height));
    let start = CellCoord::new(2, 13);
    let goal = CellCoord::new(11, 3);

    assert_eq!(search.solve(start, goal), search.solve(start, goal));
}

proptest! {
    #[test]
    fn routes_are_connected_from_start_to_goal(
        start_column in 0i32..12,
        start_row in 0i32..12,
        goal_column in 0i32..12,
        goal_row in 0i32..12,
    ) {
        let (cells, width, height) = walled_square(12);
        let search = GridSearch::new(TerrainView::new(&cells, width, height));
        let start = CellCoord::new(start_column, start_row);
        let goal = CellCoord::new(goal_column, goal_row);

        let path = search.solve(start, goal);
        prop_assert!(path.is_some());
        let path = path.unwrap();

        prop_assert_eq!(path.start(), Some(start));
        prop_assert_eq!(path.goal(), Some(goal));
        prop_assert!(path.cells().windows(2).all(|pair| pair[0].is_adjacent(pair[1])));
        prop_assert_eq!(usize::try_from(path.cost()).unwrap() + 1, path.len());
        prop_assert!(path.cost() >= start.chebyshev_distance(goal));
    }

    #[test]
    fn chebyshev_routes_are_shortest_on_open_ground(
        start_column in 0i32..12,
        start_row in 0i32..12,
        goal_column in 0i32..12,
        goal_row in 0i32..12,
    ) {
        let (cells, width, height) = walled_square(12);
        let search = GridSearch::new(TerrainView::new(&cells, width, height))
            .with_heuristic(Heuristic::Chebyshev);
        let start = CellCoord::new(start_column, start_row);
        let goal = CellCoord::new(goal_column, goal_row);

        let path = search.solve(start, goal);
        prop_assert!(path.is_some());
        prop_assert_eq!(path.unwrap().cost(), start.chebyshev_distance(goal));
    }
}
