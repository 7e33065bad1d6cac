use std::fs;
use std::io;
use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::graph::{EdgeId, RoadEdge, RoadNetwork, VertexId};

const VERTICES_TABLE: &str = "ways_vertices_pgr";
const EDGES_TABLE: &str = "ways";
const CROSSWALKS_TABLE: &str = "ways_crosswalks";

/// Load the road network stored in the SQLite database at `db_path`.
///
/// The database uses the pgRouting layout: `ways_vertices_pgr(id, lat, lon)`
/// for junctions and `ways(gid, source, target, length_m[, geom_json])` for
/// segments. Crossing features come from the optional
/// `ways_crosswalks(edge_id, cross_count)` table and are summed per edge.
/// Segments that reference unknown vertices or carry an invalid length are
/// skipped with a warning instead of failing the whole load.
pub fn load_road_network(db_path: &Path) -> Result<RoadNetwork> {
    match fs::metadata(db_path) {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(Error::DatasetNotFound {
                path: db_path.to_path_buf(),
            });
        }
        Err(err) => return Err(err.into()),
    }

    let connection = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    debug!(path = %db_path.display(), "loading road network");

    let mut network = RoadNetwork::new();
    load_vertices(&connection, &mut network)?;
    load_edges(&connection, &mut network)?;

    info!(
        path = %db_path.display(),
        vertex_count = network.vertex_count(),
        edge_count = network.edge_count(),
        "loaded road network"
    );
    Ok(network)
}

fn load_vertices(connection: &Connection, network: &mut RoadNetwork) -> Result<()> {
    if !table_has_columns(connection, VERTICES_TABLE, &["id", "lat", "lon"])? {
        return Err(Error::UnsupportedSchema {
            table: VERTICES_TABLE,
        });
    }

    let mut stmt = connection.prepare("SELECT id, lat, lon FROM ways_vertices_pgr")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, VertexId>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;

    let mut skipped = 0usize;
    for row in rows {
        let (id, lat, lon) = row?;
        let position = Coordinate::new(lat, lon);
        if position.validate().is_err() {
            skipped += 1;
            continue;
        }
        network.add_vertex(id, position);
    }

    if skipped > 0 {
        warn!(skipped, "ignored vertices with out-of-range coordinates");
    }
    Ok(())
}

fn load_edges(connection: &Connection, network: &mut RoadNetwork) -> Result<()> {
    if !table_has_columns(
        connection,
        EDGES_TABLE,
        &["gid", "source", "target", "length_m"],
    )? {
        return Err(Error::UnsupportedSchema { table: EDGES_TABLE });
    }

    let geometry_column = if table_has_columns(connection, EDGES_TABLE, &["geom_json"])? {
        "w.geom_json"
    } else {
        "NULL"
    };
    let has_crosswalks =
        table_has_columns(connection, CROSSWALKS_TABLE, &["edge_id", "cross_count"])?;
    let crossings_join = if has_crosswalks {
        "LEFT JOIN (SELECT edge_id, SUM(cross_count) AS cross_count \
         FROM ways_crosswalks GROUP BY edge_id) c ON c.edge_id = w.gid"
    } else {
        debug!("no crosswalk table; every edge has zero crossings");
        "LEFT JOIN (SELECT NULL AS edge_id, NULL AS cross_count) c ON 0"
    };

    let sql = format!(
        "SELECT w.gid, w.source, w.target, w.length_m, {geometry_column}, \
         CAST(COALESCE(c.cross_count, 0) AS INTEGER) FROM ways w {crossings_join} ORDER BY w.gid"
    );
    let mut stmt = connection.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(EdgeRow {
            gid: row.get(0)?,
            source: row.get(1)?,
            target: row.get(2)?,
            length_m: row.get(3)?,
            geom_json: row.get(4)?,
            cross_count: row.get(5)?,
        })
    })?;

    let mut skipped_edges = 0usize;
    let mut bad_geometry = 0usize;
    for row in rows {
        let row = row?;
        let geometry = match row.geom_json.as_deref().map(|raw| parse_geometry(row.gid, raw)) {
            Some(Ok(geometry)) => geometry,
            Some(Err(err)) => {
                debug!(error = %err, "falling back to straight segment");
                bad_geometry += 1;
                Vec::new()
            }
            None => Vec::new(),
        };

        let edge = RoadEdge {
            id: row.gid,
            source: row.source,
            target: row.target,
            length_m: row.length_m,
            crossing_count: u32::try_from(row.cross_count.max(0)).unwrap_or(u32::MAX),
            geometry,
        };
        if let Err(err) = network.add_edge(edge) {
            debug!(error = %err, "skipping edge");
            skipped_edges += 1;
        }
    }

    if skipped_edges > 0 {
        warn!(
            skipped_edges,
            "ignored edges referencing unknown vertices or with invalid attributes",
        );
    }
    if bad_geometry > 0 {
        warn!(bad_geometry, "edges with undecodable geometry use straight segments");
    }
    Ok(())
}

struct EdgeRow {
    gid: EdgeId,
    source: VertexId,
    target: VertexId,
    length_m: f64,
    geom_json: Option<String>,
    cross_count: i64,
}

/// Decode a GeoJSON LineString coordinate array (`[[lon, lat], ...]`).
fn parse_geometry(edge: EdgeId, raw: &str) -> Result<Vec<Coordinate>> {
    let positions: Vec<[f64; 2]> =
        serde_json::from_str(raw).map_err(|err| Error::InvalidGeometry {
            edge,
            message: err.to_string(),
        })?;
    if positions.len() < 2 {
        return Err(Error::InvalidGeometry {
            edge,
            message: format!("expected at least 2 positions, got {}", positions.len()),
        });
    }

    let coordinates: Vec<Coordinate> = positions
        .into_iter()
        .map(Coordinate::from_position)
        .collect();
    for coordinate in &coordinates {
        coordinate.validate().map_err(|err| Error::InvalidGeometry {
            edge,
            message: err.to_string(),
        })?;
    }
    Ok(coordinates)
}

fn table_has_columns(connection: &Connection, table: &str, required: &[&str]) -> Result<bool> {
    let pragma = format!("PRAGMA table_info('{table}')");
    let mut stmt = connection.prepare(&pragma)?;
    let mut rows = stmt.query([])?;

    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        columns.push(name);
    }

    Ok(required.iter().all(|required| {
        columns
            .iter()
            .any(|column| column.eq_ignore_ascii_case(required))
    }))
}
