//! # GRASS Adapter
//!
//! Implements the toolbox ports by invoking GRASS GIS modules as
//! subprocesses. The modules (`r.viewshed`, `v.select`, ...) are expected
//! on `PATH`, i.e. the tools run inside a GRASS session.
//!
//! Every invocation runs quiet (`GRASS_VERBOSE=0`) and with overwrite
//! enabled (`GRASS_OVERWRITE=1`): the temporary maps are rewritten on
//! every iteration. Whether an existing *output* layer may be replaced is
//! the caller's decision, checked through `layer_exists` before a run.
//!
//! Argument construction is kept in pure helper functions; textual output
//! goes through the typed parsers in `core::parse`.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use crate::core::parse;
use crate::core::{Coord, ObserverPoint, ViewshedParams, ViewshedRecord, OUTPUT_COLUMNS};
use crate::ports::{MapKind, RasterOps, ToolboxError, ToolboxResult, VectorOps, Viewshed};

/// Subprocess-backed GRASS toolbox
#[derive(Clone, Copy, Debug, Default)]
pub struct GrassToolbox;

impl GrassToolbox {
    /// Create a toolbox handle
    pub fn new() -> Self {
        Self
    }

    fn command(&self, tool: &str, args: &[String]) -> Command {
        let mut cmd = Command::new(tool);
        cmd.args(args)
            .env("GRASS_OVERWRITE", "1")
            .env("GRASS_VERBOSE", "0");
        cmd
    }

    /// Run a module for its side effect
    fn run(&self, tool: &str, args: &[String]) -> ToolboxResult<()> {
        tracing::debug!(tool, ?args, "toolbox command");
        let output = self
            .command(tool, args)
            .output()
            .map_err(|source| spawn_error(tool, source))?;
        check_status(tool, &output)
    }

    /// Run a module and capture its stdout
    fn read(&self, tool: &str, args: &[String]) -> ToolboxResult<String> {
        tracing::debug!(tool, ?args, "toolbox query");
        let output = self
            .command(tool, args)
            .output()
            .map_err(|source| spawn_error(tool, source))?;
        check_status(tool, &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run a module feeding `input` to its stdin
    fn write(&self, tool: &str, args: &[String], input: &str) -> ToolboxResult<()> {
        tracing::debug!(tool, ?args, "toolbox command with stdin");
        let mut child = self
            .command(tool, args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| spawn_error(tool, source))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .map_err(|source| spawn_error(tool, source))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|source| spawn_error(tool, source))?;
        check_status(tool, &output)
    }
}

fn spawn_error(tool: &str, source: std::io::Error) -> ToolboxError {
    ToolboxError::Spawn {
        tool: tool.to_string(),
        source,
    }
}

fn check_status(tool: &str, output: &Output) -> ToolboxResult<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(ToolboxError::Failed {
        tool: tool.to_string(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

// ── argument builders ───────────────────────────────────────────────────

fn viewshed_args(
    elevation: &str,
    output: &str,
    observer: Coord,
    params: &ViewshedParams,
) -> Vec<String> {
    let mut args = vec![
        format!("input={elevation}"),
        format!("output={output}"),
        format!("coordinates={observer}"),
        format!("observer_elevation={}", params.observer_elevation),
        format!("max_distance={}", params.max_distance),
    ];
    if params.curvature {
        args.push("-c".to_string());
    }
    args
}

fn tag_expression(source: &str, output: &str, category: i64) -> String {
    format!("{output} = if({source}, {category}, null())")
}

fn select_args(points: &str, areas: &str, output: &str) -> Vec<String> {
    vec![
        "-t".to_string(),
        format!("ainput={points}"),
        "atype=point".to_string(),
        format!("binput={areas}"),
        "btype=area".to_string(),
        "operator=overlap".to_string(),
        format!("output={output}"),
    ]
}

fn distance_args(from: &str, to: &str, min_distance: f64) -> Vec<String> {
    vec![
        "-p".to_string(),
        format!("from={from}"),
        "from_type=point".to_string(),
        format!("to={to}"),
        "to_type=point".to_string(),
        "upload=dist".to_string(),
        format!("dmin={min_distance}"),
    ]
}

/// Extra columns of the output attribute table; the `cat` key column is
/// added by the table-creation module itself
fn table_columns() -> String {
    OUTPUT_COLUMNS
        .iter()
        .filter(|(name, _)| *name != "cat")
        .map(|(name, sql_type)| format!("{name} {sql_type}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// One point in the standard vector ascii format understood by the edit
/// module: primitive header, coordinate, then layer/category
fn point_geometry(coord: Coord, category: i64) -> String {
    format!("P 1 1\n{} {}\n1 {}\n", coord.x, coord.y, category)
}

fn insert_sql(table: &str, record: &ViewshedRecord) -> String {
    format!(
        "INSERT INTO {table} (cat,area,n_points_visible,distance_to_closest) \
         VALUES ({},{},{},{})",
        record.category, record.area, record.n_points_visible, record.distance_to_closest
    )
}

// ── port implementations ────────────────────────────────────────────────

impl Viewshed for GrassToolbox {
    fn viewshed(
        &self,
        elevation: &str,
        output: &str,
        observer: Coord,
        params: &ViewshedParams,
    ) -> ToolboxResult<()> {
        self.run(
            "r.viewshed",
            &viewshed_args(elevation, output, observer, params),
        )
    }
}

impl RasterOps for GrassToolbox {
    fn tag_visible(&self, source: &str, output: &str, category: i64) -> ToolboxResult<()> {
        let expression = tag_expression(source, output, category);
        self.run("r.mapcalc", &[format!("expression={expression}")])
    }

    fn cell_count(&self, map: &str) -> ToolboxResult<u64> {
        let summary = self.read("r.univar", &["-g".to_string(), format!("map={map}")])?;
        Ok(parse::parse_count(&summary, "n")?)
    }

    fn region_resolution(&self) -> ToolboxResult<f64> {
        let region = self.read("g.region", &["-g".to_string()])?;
        Ok(parse::parse_resolution(&region)?)
    }

    fn to_areas(&self, raster: &str, vector: &str) -> ToolboxResult<()> {
        self.run(
            "r.to.vect",
            &[
                format!("input={raster}"),
                format!("output={vector}"),
                "type=area".to_string(),
            ],
        )
    }

    fn remove(&self, kind: MapKind, names: &[String]) -> ToolboxResult<()> {
        self.run(
            "g.remove",
            &[
                "-f".to_string(),
                format!("type={}", kind.as_str()),
                format!("name={}", names.join(",")),
            ],
        )
    }
}

impl VectorOps for GrassToolbox {
    fn read_points(&self, layer: &str) -> ToolboxResult<Vec<ObserverPoint>> {
        let dump = self.read(
            "v.out.ascii",
            &[
                format!("input={layer}"),
                "format=point".to_string(),
                "separator=pipe".to_string(),
            ],
        )?;
        Ok(parse::parse_points(&dump)?)
    }

    fn layer_exists(&self, name: &str) -> ToolboxResult<bool> {
        let listing = self.read(
            "g.list",
            &["type=vector".to_string(), format!("pattern={name}")],
        )?;
        Ok(listing.lines().any(|line| line.trim() == name))
    }

    fn select_overlapping(&self, points: &str, areas: &str, output: &str) -> ToolboxResult<()> {
        self.run("v.select", &select_args(points, areas, output))
    }

    fn point_count(&self, layer: &str) -> ToolboxResult<u64> {
        let topo = self.read("v.info", &["-t".to_string(), format!("map={layer}")])?;
        Ok(parse::parse_count(&topo, "points")?)
    }

    fn write_point(&self, output: &str, coord: Coord) -> ToolboxResult<()> {
        self.write(
            "v.in.ascii",
            &[
                "input=-".to_string(),
                format!("output={output}"),
                "separator=pipe".to_string(),
            ],
            &format!("{}|{}\n", coord.x, coord.y),
        )
    }

    fn min_distance(&self, from: &str, to: &str, min_distance: f64) -> ToolboxResult<f64> {
        let table = self.read("v.distance", &distance_args(from, to, min_distance))?;
        Ok(parse::parse_min_distance(&table)?)
    }

    fn create_output(&self, name: &str) -> ToolboxResult<()> {
        self.run(
            "v.edit",
            &[format!("map={name}"), "tool=create".to_string()],
        )?;
        self.run(
            "v.db.addtable",
            &[
                format!("map={name}"),
                format!("columns={}", table_columns()),
            ],
        )
    }

    fn append_record(
        &self,
        output: &str,
        point: &ObserverPoint,
        record: &ViewshedRecord,
    ) -> ToolboxResult<()> {
        self.write(
            "v.edit",
            &[
                format!("map={output}"),
                "tool=add".to_string(),
                "input=-".to_string(),
            ],
            &point_geometry(point.coord, point.category),
        )?;
        // one statement per row, committed on its own
        self.run(
            "db.execute",
            &[format!("sql={}", insert_sql(output, record))],
        )
    }
}
