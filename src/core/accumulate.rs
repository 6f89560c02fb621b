//! # Accumulation Loop
//!
//! The per-point viewshed accumulation: one external viewshed per
//! observer, an overlap test against the other observers, and one
//! committed output row per point.
//!
//! The loop is strictly sequential. Every iteration reuses the same four
//! temporary map names, which bounds disk usage and rules out concurrent
//! iterations by construction.
//!
//! Temporary maps are released by `TempGuard`, a scoped guard that fires
//! exactly once when the run ends — normal return, error propagation, or
//! unwind — and ignores removal failures.

use crate::core::params::{TempMaps, ViewshedParams, MIN_NEIGHBOR_DISTANCE};
use crate::core::point::ObserverPoint;
use crate::core::record::ViewshedRecord;
use crate::ports::{MapKind, RasterOps, ToolboxResult, VectorOps, Viewshed};

/// One accumulation run over an input point layer
#[derive(Clone, Debug)]
pub struct Job {
    /// Elevation raster the viewsheds are computed from
    pub elevation: String,
    /// Input observer point layer
    pub points: String,
    /// Output point layer receiving one row per observer
    pub output: String,
    /// Basename of the retained per-observer viewshed rasters
    /// (`<basename>_<category>`)
    pub basename: String,
    /// Parameters forwarded to the viewshed command
    pub params: ViewshedParams,
    /// Keep the temporary maps instead of removing them on exit
    pub keep_temporaries: bool,
}

impl Job {
    /// Create a job with default viewshed parameters
    pub fn new(
        elevation: impl Into<String>,
        points: impl Into<String>,
        output: impl Into<String>,
        basename: impl Into<String>,
    ) -> Self {
        Self {
            elevation: elevation.into(),
            points: points.into(),
            output: output.into(),
            basename: basename.into(),
            params: ViewshedParams::default(),
            keep_temporaries: false,
        }
    }

    /// Set the viewshed parameters
    pub fn with_params(mut self, params: ViewshedParams) -> Self {
        self.params = params;
        self
    }

    /// Keep temporary maps for inspection
    pub fn keep_temporaries(mut self, keep: bool) -> Self {
        self.keep_temporaries = keep;
        self
    }
}

/// Scoped cleanup of registered temporary maps
///
/// Owns the list of `(kind, name)` pairs created during a run and removes
/// them when dropped. Removal is best effort: failures are logged at
/// debug level and otherwise indistinguishable from success.
struct TempGuard<'a, T: RasterOps> {
    toolbox: &'a T,
    registered: Vec<(MapKind, String)>,
}

impl<'a, T: RasterOps> TempGuard<'a, T> {
    fn new(toolbox: &'a T) -> Self {
        Self {
            toolbox,
            registered: Vec::new(),
        }
    }

    fn register(&mut self, kind: MapKind, name: &str) {
        self.registered.push((kind, name.to_string()));
    }
}

impl<T: RasterOps> Drop for TempGuard<'_, T> {
    fn drop(&mut self) {
        for kind in [MapKind::Raster, MapKind::Vector] {
            let names: Vec<String> = self
                .registered
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, n)| n.clone())
                .collect();
            if names.is_empty() {
                continue;
            }
            if let Err(err) = self.toolbox.remove(kind, &names) {
                tracing::debug!(%err, "temporary map removal failed");
            }
        }
    }
}

/// Run the accumulation over every observer of the input layer
///
/// Produces one committed output row per observer, in input order, and
/// returns the records. Any external failure aborts the remaining
/// iteration; rows committed before the failure stay in the output layer,
/// and the temporary maps are removed regardless.
pub fn accumulate<T>(toolbox: &T, job: &Job) -> ToolboxResult<Vec<ViewshedRecord>>
where
    T: Viewshed + RasterOps + VectorOps,
{
    let temps = TempMaps::for_current_process();
    let mut guard = TempGuard::new(toolbox);
    if !job.keep_temporaries {
        guard.register(MapKind::Raster, &temps.viewshed);
        guard.register(MapKind::Vector, &temps.viewshed_vector);
        guard.register(MapKind::Vector, &temps.visible_points);
        guard.register(MapKind::Vector, &temps.current_point);
    }

    let resolution = toolbox.region_resolution()?;
    let observers = toolbox.read_points(&job.points)?;
    tracing::info!(
        points = observers.len(),
        resolution,
        output = %job.output,
        "starting viewshed accumulation"
    );

    toolbox.create_output(&job.output)?;

    let mut records = Vec::with_capacity(observers.len());
    for observer in &observers {
        let record = analyze_point(toolbox, job, &temps, resolution, observer)?;
        toolbox.append_record(&job.output, observer, &record)?;
        tracing::info!(
            category = record.category,
            area = record.area,
            visible = record.n_points_visible,
            distance = record.distance_to_closest,
            "observer processed"
        );
        records.push(record);
    }
    Ok(records)
}

/// Analyze a single observer: viewshed, area, visible neighbors, distance
fn analyze_point<T>(
    toolbox: &T,
    job: &Job,
    temps: &TempMaps,
    resolution: f64,
    observer: &ObserverPoint,
) -> ToolboxResult<ViewshedRecord>
where
    T: Viewshed + RasterOps + VectorOps,
{
    let tagged = format!("{}_{}", job.basename, observer.category);
    toolbox.viewshed(&job.elevation, &temps.viewshed, observer.coord, &job.params)?;
    toolbox.tag_visible(&temps.viewshed, &tagged, observer.category)?;

    let cells = toolbox.cell_count(&tagged)?;
    let area = cells as f64 * resolution * resolution;

    toolbox.to_areas(&tagged, &temps.viewshed_vector)?;
    toolbox.select_overlapping(&job.points, &temps.viewshed_vector, &temps.visible_points)?;
    // the observer overlaps its own footprint and is part of the selection
    let n_points_visible = toolbox.point_count(&temps.visible_points)?.saturating_sub(1);

    if n_points_visible == 0 {
        return Ok(ViewshedRecord::isolated(observer.category, area));
    }

    toolbox.write_point(&temps.current_point, observer.coord)?;
    let distance = toolbox.min_distance(
        &temps.current_point,
        &temps.visible_points,
        MIN_NEIGHBOR_DISTANCE,
    )?;
    Ok(ViewshedRecord {
        category: observer.category,
        area,
        n_points_visible,
        distance_to_closest: distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse::ParseError;
    use crate::core::point::Coord;
    use crate::ports::ToolboxError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const OBSERVERS: &str = "observers";

    /// A circular viewshed footprint around an observer
    #[derive(Clone, Copy)]
    struct Disk {
        center: Coord,
        radius: f64,
        cells: u64,
    }

    #[derive(Default)]
    struct State {
        resolution: f64,
        view_radius: f64,
        visible_cells: u64,
        rasters: HashMap<String, Disk>,
        areas: HashMap<String, Disk>,
        layers: HashMap<String, Vec<ObserverPoint>>,
        outputs: HashMap<String, Vec<(ObserverPoint, ViewshedRecord)>>,
        removed: Vec<(MapKind, String)>,
        viewshed_calls: usize,
        fail_viewshed_on_call: Option<usize>,
    }

    /// In-memory toolbox: every viewshed is a disk of `view_radius` around
    /// the observer covering `visible_cells` cells, and vector layers are
    /// plain point lists. Geometry (overlap, distances) is computed for
    /// real, so the end-to-end scenarios are meaningful.
    struct MockGis {
        state: RefCell<State>,
    }

    impl MockGis {
        fn new(points: Vec<ObserverPoint>, resolution: f64, view_radius: f64) -> Self {
            let mut state = State {
                resolution,
                view_radius,
                visible_cells: 25,
                ..State::default()
            };
            state.layers.insert(OBSERVERS.to_string(), points);
            Self {
                state: RefCell::new(state),
            }
        }

        fn fail_viewshed_on_call(self, call: usize) -> Self {
            self.state.borrow_mut().fail_viewshed_on_call = Some(call);
            self
        }

        fn removed(&self) -> Vec<(MapKind, String)> {
            self.state.borrow().removed.clone()
        }

        fn output_rows(&self, name: &str) -> Vec<(ObserverPoint, ViewshedRecord)> {
            self.state.borrow().outputs.get(name).cloned().unwrap_or_default()
        }
    }

    fn tool_failed(tool: &str, detail: &str) -> ToolboxError {
        ToolboxError::Failed {
            tool: tool.to_string(),
            status: "exit status: 1".to_string(),
            stderr: detail.to_string(),
        }
    }

    impl Viewshed for MockGis {
        fn viewshed(
            &self,
            _elevation: &str,
            output: &str,
            observer: Coord,
            _params: &ViewshedParams,
        ) -> ToolboxResult<()> {
            let mut state = self.state.borrow_mut();
            state.viewshed_calls += 1;
            if state.fail_viewshed_on_call == Some(state.viewshed_calls) {
                return Err(tool_failed("r.viewshed", "simulated failure"));
            }
            let disk = Disk {
                center: observer,
                radius: state.view_radius,
                cells: state.visible_cells,
            };
            state.rasters.insert(output.to_string(), disk);
            Ok(())
        }
    }

    impl RasterOps for MockGis {
        fn tag_visible(&self, source: &str, output: &str, _category: i64) -> ToolboxResult<()> {
            let mut state = self.state.borrow_mut();
            let disk = *state
                .rasters
                .get(source)
                .ok_or_else(|| tool_failed("r.mapcalc", "source raster missing"))?;
            state.rasters.insert(output.to_string(), disk);
            Ok(())
        }

        fn cell_count(&self, map: &str) -> ToolboxResult<u64> {
            self.state
                .borrow()
                .rasters
                .get(map)
                .map(|d| d.cells)
                .ok_or_else(|| tool_failed("r.univar", "raster missing"))
        }

        fn region_resolution(&self) -> ToolboxResult<f64> {
            Ok(self.state.borrow().resolution)
        }

        fn to_areas(&self, raster: &str, vector: &str) -> ToolboxResult<()> {
            let mut state = self.state.borrow_mut();
            let disk = *state
                .rasters
                .get(raster)
                .ok_or_else(|| tool_failed("r.to.vect", "raster missing"))?;
            state.areas.insert(vector.to_string(), disk);
            Ok(())
        }

        fn remove(&self, kind: MapKind, names: &[String]) -> ToolboxResult<()> {
            let mut state = self.state.borrow_mut();
            for name in names {
                state.rasters.remove(name);
                state.areas.remove(name);
                state.layers.remove(name);
                state.removed.push((kind, name.clone()));
            }
            Ok(())
        }
    }

    impl VectorOps for MockGis {
        fn read_points(&self, layer: &str) -> ToolboxResult<Vec<ObserverPoint>> {
            self.state
                .borrow()
                .layers
                .get(layer)
                .cloned()
                .ok_or_else(|| tool_failed("v.out.ascii", "layer missing"))
        }

        fn layer_exists(&self, name: &str) -> ToolboxResult<bool> {
            let state = self.state.borrow();
            Ok(state.layers.contains_key(name) || state.outputs.contains_key(name))
        }

        fn select_overlapping(
            &self,
            points: &str,
            areas: &str,
            output: &str,
        ) -> ToolboxResult<()> {
            let mut state = self.state.borrow_mut();
            let disk = *state
                .areas
                .get(areas)
                .ok_or_else(|| tool_failed("v.select", "area layer missing"))?;
            let selected: Vec<ObserverPoint> = state
                .layers
                .get(points)
                .ok_or_else(|| tool_failed("v.select", "point layer missing"))?
                .iter()
                .filter(|p| p.coord.distance(&disk.center) <= disk.radius)
                .copied()
                .collect();
            state.layers.insert(output.to_string(), selected);
            Ok(())
        }

        fn point_count(&self, layer: &str) -> ToolboxResult<u64> {
            self.state
                .borrow()
                .layers
                .get(layer)
                .map(|p| p.len() as u64)
                .ok_or_else(|| tool_failed("v.info", "layer missing"))
        }

        fn write_point(&self, output: &str, coord: Coord) -> ToolboxResult<()> {
            self.state
                .borrow_mut()
                .layers
                .insert(output.to_string(), vec![ObserverPoint::new(1, coord.x, coord.y)]);
            Ok(())
        }

        fn min_distance(&self, from: &str, to: &str, min_distance: f64) -> ToolboxResult<f64> {
            let state = self.state.borrow();
            let origin = state
                .layers
                .get(from)
                .and_then(|l| l.first())
                .ok_or_else(|| tool_failed("v.distance", "from layer missing"))?
                .coord;
            state
                .layers
                .get(to)
                .ok_or_else(|| tool_failed("v.distance", "to layer missing"))?
                .iter()
                .map(|p| origin.distance(&p.coord))
                .filter(|d| *d >= min_distance)
                .min_by(|a, b| a.total_cmp(b))
                .ok_or(ToolboxError::Parse(ParseError::TruncatedTable { lines: 1 }))
        }

        fn create_output(&self, name: &str) -> ToolboxResult<()> {
            self.state
                .borrow_mut()
                .outputs
                .insert(name.to_string(), Vec::new());
            Ok(())
        }

        fn append_record(
            &self,
            output: &str,
            point: &ObserverPoint,
            record: &ViewshedRecord,
        ) -> ToolboxResult<()> {
            self.state
                .borrow_mut()
                .outputs
                .get_mut(output)
                .ok_or_else(|| tool_failed("db.execute", "output layer missing"))?
                .push((*point, record.clone()));
            Ok(())
        }
    }

    fn colinear_points() -> Vec<ObserverPoint> {
        vec![
            ObserverPoint::new(1, 0.0, 0.0),
            ObserverPoint::new(2, 100.0, 0.0),
            ObserverPoint::new(3, 200.0, 0.0),
        ]
    }

    fn job() -> Job {
        Job::new("elevation", OBSERVERS, "observers_out", "viewshed")
    }

    #[test]
    fn test_one_row_per_point_in_input_order() {
        let gis = MockGis::new(colinear_points(), 10.0, f64::INFINITY);
        let records = accumulate(&gis, &job()).unwrap();
        let cats: Vec<i64> = records.iter().map(|r| r.category).collect();
        assert_eq!(cats, [1, 2, 3]);

        let rows = gis.output_rows("observers_out");
        assert_eq!(rows.len(), 3);
        for (row, record) in rows.iter().zip(&records) {
            assert_eq!(&row.1, record);
        }
    }

    #[test]
    fn test_isolated_point_gets_exact_zero_distance() {
        let points = vec![ObserverPoint::new(1, 0.0, 0.0)];
        let gis = MockGis::new(points, 10.0, f64::INFINITY);
        let records = accumulate(&gis, &job()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].n_points_visible, 0);
        assert_eq!(records[0].distance_to_closest, 0.0);
    }

    #[test]
    fn test_out_of_range_neighbors_are_not_visible() {
        // neighbors beyond the viewshed radius do not count
        let points = vec![
            ObserverPoint::new(1, 0.0, 0.0),
            ObserverPoint::new(2, 500.0, 0.0),
        ];
        let gis = MockGis::new(points, 10.0, 50.0);
        let records = accumulate(&gis, &job()).unwrap();
        for record in &records {
            assert_eq!(record.n_points_visible, 0);
            assert_eq!(record.distance_to_closest, 0.0);
        }
    }

    #[test]
    fn test_colinear_points_see_each_other() {
        let gis = MockGis::new(colinear_points(), 10.0, f64::INFINITY);
        let records = accumulate(&gis, &job()).unwrap();
        for record in &records {
            assert_eq!(record.n_points_visible, 2);
            assert_eq!(record.distance_to_closest, 100.0);
        }
    }

    #[test]
    fn test_area_is_cell_count_times_resolution_squared() {
        // 25 visible cells at resolution 10 -> 2500 square units
        let gis = MockGis::new(colinear_points(), 10.0, f64::INFINITY);
        let records = accumulate(&gis, &job()).unwrap();
        for record in &records {
            assert_eq!(record.area, 2500.0);
        }
    }

    #[test]
    fn test_distance_floor_excludes_sub_unit_neighbors() {
        let points = vec![
            ObserverPoint::new(1, 0.0, 0.0),
            ObserverPoint::new(2, 0.5, 0.0),
            ObserverPoint::new(3, 50.0, 0.0),
        ];
        let gis = MockGis::new(points, 10.0, f64::INFINITY);
        let records = accumulate(&gis, &job()).unwrap();
        // the 0.5-unit neighbor is inside the viewshed but below the
        // reporting floor, so the nearest reported distance skips it
        assert_eq!(records[0].n_points_visible, 2);
        assert_eq!(records[0].distance_to_closest, 50.0);
    }

    #[test]
    fn test_failure_midway_keeps_committed_rows_and_cleans_temps() {
        let gis =
            MockGis::new(colinear_points(), 10.0, f64::INFINITY).fail_viewshed_on_call(2);
        let err = accumulate(&gis, &job()).unwrap_err();
        assert!(matches!(err, ToolboxError::Failed { .. }));

        // the row committed before the failure survives
        let rows = gis.output_rows("observers_out");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.category, 1);

        // every registered temp was removed, with its proper kind
        let temps = TempMaps::for_current_process();
        let removed = gis.removed();
        assert_eq!(removed.len(), 4);
        assert!(removed.contains(&(MapKind::Raster, temps.viewshed.clone())));
        assert!(removed.contains(&(MapKind::Vector, temps.viewshed_vector.clone())));
        assert!(removed.contains(&(MapKind::Vector, temps.visible_points.clone())));
        assert!(removed.contains(&(MapKind::Vector, temps.current_point.clone())));
    }

    #[test]
    fn test_cleanup_runs_after_normal_completion() {
        let gis = MockGis::new(colinear_points(), 10.0, f64::INFINITY);
        accumulate(&gis, &job()).unwrap();
        assert_eq!(gis.removed().len(), 4);
    }

    #[test]
    fn test_keep_flag_disarms_cleanup() {
        let gis = MockGis::new(colinear_points(), 10.0, f64::INFINITY);
        accumulate(&gis, &job().keep_temporaries(true)).unwrap();
        assert!(gis.removed().is_empty());
    }

    #[test]
    fn test_rerun_reproduces_identical_rows() {
        let gis = MockGis::new(colinear_points(), 10.0, f64::INFINITY);
        let first = accumulate(&gis, &job()).unwrap();
        let second = accumulate(&gis, &job()).unwrap();
        assert_eq!(first, second);
        // the output layer is recreated, not appended to
        assert_eq!(gis.output_rows("observers_out").len(), 3);
    }
}
