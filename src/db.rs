//! Layout base: an SQLite database storing a laid-out poagraph.
//!
//! Laying out a large graph takes longer than an interactive viewer can wait.
//! A layout base stores the result of [`CachedLayout::build`] so that a viewer can fetch column windows directly from the file.
//! The windows are identical to those returned by [`viewport::select`] on the in-memory layout.
//!
//! ### Schema
//!
//! * `Tags(key, value)`: database version, dataset key, and node/edge/column/chain counts.
//! * `Nodes(id, column_id, slot, x, y, aligned_to, label, chain)`: one row per node, indexed by `column_id`.
//!   `slot` is the rank of the node within its column in placement order.
//! * `Edges(source, rank, target, kind, sequences)`: outgoing edges of each node in their original order.
//!   Sequence identifiers are stored as a JSON array.
//! * `Chains(id, nodes)`: compacted chains as JSON arrays of node identifiers.

use crate::{CachedLayout, ColumnIndex, ColumnRange, DatasetKey, GraphEdge, LaidOutNode, LayoutParams, PoaGraph, Viewport};
use crate::formats::{self, EdgeElement, NodeElement};
use crate::graph::EdgeKind;
use crate::layout::classify_edge;
use crate::{utils, viewport};

use std::path::Path;
use std::str::FromStr;

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, Statement};


//-----------------------------------------------------------------------------

/// A database connection to a layout base.
///
/// This structure stores a database connection and the header information.
/// In multi-threaded applications, each thread should have its own connection.
/// Queries are supported through the [`LayoutInterface`] structure.
///
/// # Examples
///
/// ```
/// use poagraph_view::{utils, LayoutBase, LayoutParams};
/// use simple_sds::serialize;
/// use std::fs;
///
/// let json_file = utils::get_test_data("example.json");
/// let db_file = serialize::temp_file_name("layout-base");
/// assert!(!utils::file_exists(&db_file));
/// let result = LayoutBase::create_from_file(&json_file, &db_file, &LayoutParams::default());
/// assert!(result.is_ok());
///
/// let database = LayoutBase::open(&db_file).unwrap();
/// assert_eq!(database.version(), LayoutBase::VERSION);
/// assert_eq!(database.nodes(), 10);
/// assert_eq!(database.columns(), 7);
///
/// drop(database);
/// fs::remove_file(&db_file).unwrap();
/// ```
#[derive(Debug)]
pub struct LayoutBase {
    connection: Connection,
    version: String,
    key: DatasetKey,
    nodes: usize,
    edges: usize,
    columns: usize,
    chains: usize,
}

/// Using the database.
impl LayoutBase {
    // Key for database version.
    const KEY_VERSION: &'static str = "version";

    /// Current database version.
    pub const VERSION: &'static str = "Poagraph-layout v0.1.0";

    // Key for the dataset key.
    const KEY_DATASET: &'static str = "dataset";

    // Key for node count.
    const KEY_NODES: &'static str = "nodes";

    // Key for edge count.
    const KEY_EDGES: &'static str = "edges";

    // Key for column count.
    const KEY_COLUMNS: &'static str = "columns";

    // Key for chain count.
    const KEY_CHAINS: &'static str = "chains";

    /// Opens a connection to the database in the given file.
    ///
    /// Reads the header information and passes through any database errors.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self, String> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(filename, flags).map_err(|x| x.to_string())?;

        let mut get_tag = connection.prepare(
            "SELECT value FROM Tags WHERE key = ?1"
        ).map_err(|x| x.to_string())?;
        let version = get_string_value(&mut get_tag, Self::KEY_VERSION)?;
        if version != Self::VERSION {
            return Err(format!("Unsupported database version: {} (expected {})", version, Self::VERSION));
        }
        let key = DatasetKey::from_str(&get_string_value(&mut get_tag, Self::KEY_DATASET)?)?;
        let nodes = get_numeric_value(&mut get_tag, Self::KEY_NODES)?;
        let edges = get_numeric_value(&mut get_tag, Self::KEY_EDGES)?;
        let columns = get_numeric_value(&mut get_tag, Self::KEY_COLUMNS)?;
        let chains = get_numeric_value(&mut get_tag, Self::KEY_CHAINS)?;
        drop(get_tag);

        Ok(LayoutBase { connection, version, key, nodes, edges, columns, chains })
    }

    /// Returns the filename of the database or [`None`] if there is no filename.
    pub fn filename(&self) -> Option<&str> {
        self.connection.path()
    }

    /// Returns the size of the database file in a human-readable format.
    pub fn file_size(&self) -> Option<String> {
        let filename = self.filename()?;
        utils::file_size(filename)
    }

    /// Returns the version of the database.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the key of the dataset the layout was built from.
    pub fn key(&self) -> DatasetKey {
        self.key
    }

    /// Returns the number of nodes in the graph.
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Returns the number of edges in the graph.
    pub fn edges(&self) -> usize {
        self.edges
    }

    /// Returns the number of columns, including empty ones.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Returns the number of compacted chains.
    pub fn chains(&self) -> usize {
        self.chains
    }

    /// Returns the last column identifier, or [`None`] if the graph is empty.
    pub fn max_column(&self) -> Option<usize> {
        self.columns.checked_sub(1)
    }
}

//-----------------------------------------------------------------------------

/// Creating the database.
impl LayoutBase {
    /// Creates a new database from a dataset file.
    ///
    /// The dataset is a JSON file, which may be gzip-compressed.
    /// The dataset key is computed from the parsed dataset, so it is the same as for an upload of the same content.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset cannot be read or laid out, or if the database already exists.
    /// Passes through any database errors.
    pub fn create_from_file<P: AsRef<Path>, Q: AsRef<Path>>(json_file: P, db_file: Q, params: &LayoutParams) -> Result<(), String> {
        log::info!("Loading dataset {}", json_file.as_ref().display());
        let dataset = formats::read_dataset(&json_file)?;
        let key = DatasetKey::of(&dataset);
        let graph = PoaGraph::from_record(&dataset)?;
        let layout = CachedLayout::build(key, &graph, params)?;
        Self::create(&layout, db_file)
    }

    /// Creates a new database from the given layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database already exists.
    /// Passes through any database errors.
    pub fn create<P: AsRef<Path>>(layout: &CachedLayout, filename: P) -> Result<(), String> {
        log::info!("Creating database {}", filename.as_ref().display());
        if utils::file_exists(&filename) {
            return Err(format!("Database {} already exists", filename.as_ref().display()));
        }

        let mut connection = Connection::open(filename).map_err(|x| x.to_string())?;
        Self::insert_tags(layout, &mut connection).map_err(|x| x.to_string())?;
        Self::insert_nodes(layout, &mut connection).map_err(|x| x.to_string())?;
        Self::insert_edges(layout, &mut connection)?;
        Self::insert_chains(layout, &mut connection)?;
        Ok(())
    }

    fn insert_tags(layout: &CachedLayout, connection: &mut Connection) -> rusqlite::Result<()> {
        log::info!("Inserting header");

        connection.execute(
            "CREATE TABLE Tags (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            ) STRICT",
            (),
        )?;

        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO Tags(key, value) VALUES (?1, ?2)"
            )?;
            insert.execute((Self::KEY_VERSION, Self::VERSION))?;
            insert.execute((Self::KEY_DATASET, layout.key().to_string()))?;
            insert.execute((Self::KEY_NODES, layout.node_count().to_string()))?;
            insert.execute((Self::KEY_EDGES, layout.edge_count().to_string()))?;
            insert.execute((Self::KEY_COLUMNS, layout.column_index().len().to_string()))?;
            insert.execute((Self::KEY_CHAINS, layout.chains().len().to_string()))?;
        }
        transaction.commit()?;

        Ok(())
    }

    fn insert_nodes(layout: &CachedLayout, connection: &mut Connection) -> rusqlite::Result<()> {
        log::info!("Inserting nodes");

        connection.execute(
            "CREATE TABLE Nodes (
                id INTEGER PRIMARY KEY,
                column_id INTEGER NOT NULL,
                slot INTEGER NOT NULL,
                x REAL NOT NULL,
                y REAL NOT NULL,
                aligned_to INTEGER,
                label TEXT NOT NULL,
                chain INTEGER
            ) STRICT",
            (),
        )?;

        let mut inserted = 0;
        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO Nodes(id, column_id, slot, x, y, aligned_to, label, chain)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            )?;
            let index = layout.column_index();
            for column_id in 0..index.len() {
                for (slot, node_id) in index.column(column_id).iter().enumerate() {
                    if let Some(node) = layout.node(*node_id) {
                        insert.execute((
                            node_id, node.column_id, slot,
                            node.x, node.y,
                            node.aligned_to_id, &node.label, node.chain
                        ))?;
                        inserted += 1;
                    }
                }
            }
        }
        transaction.commit()?;

        connection.execute("CREATE INDEX NodeColumns ON Nodes(column_id)", ())?;

        log::info!("Inserted {} node records", inserted);
        Ok(())
    }

    fn insert_edges(layout: &CachedLayout, connection: &mut Connection) -> Result<(), String> {
        log::info!("Inserting edges");

        connection.execute(
            "CREATE TABLE Edges (
                source INTEGER NOT NULL,
                rank INTEGER NOT NULL,
                target INTEGER NOT NULL,
                kind INTEGER NOT NULL,
                sequences TEXT NOT NULL,
                PRIMARY KEY (source, rank)
            ) STRICT",
            (),
        ).map_err(|x| x.to_string())?;

        let mut inserted = 0;
        let transaction = connection.transaction().map_err(|x| x.to_string())?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO Edges(source, rank, target, kind, sequences) VALUES (?1, ?2, ?3, ?4, ?5)"
            ).map_err(|x| x.to_string())?;
            for node_id in 0..layout.node_count() {
                for (rank, edge) in layout.outgoing(node_id).iter().enumerate() {
                    let sequences = serde_json::to_string(&edge.sequence_ids).map_err(|x| x.to_string())?;
                    insert.execute((
                        edge.source_id, rank, edge.target_id, edge.kind.code(), sequences
                    )).map_err(|x| x.to_string())?;
                    inserted += 1;
                }
            }
        }
        transaction.commit().map_err(|x| x.to_string())?;

        log::info!("Inserted {} edge records", inserted);
        Ok(())
    }

    fn insert_chains(layout: &CachedLayout, connection: &mut Connection) -> Result<(), String> {
        log::info!("Inserting chains");

        connection.execute(
            "CREATE TABLE Chains (
                id INTEGER PRIMARY KEY,
                nodes TEXT NOT NULL
            ) STRICT",
            (),
        ).map_err(|x| x.to_string())?;

        let transaction = connection.transaction().map_err(|x| x.to_string())?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO Chains(id, nodes) VALUES (?1, ?2)"
            ).map_err(|x| x.to_string())?;
            for (chain_id, chain) in layout.chains().iter().enumerate() {
                let nodes = serde_json::to_string(chain).map_err(|x| x.to_string())?;
                insert.execute((chain_id, nodes)).map_err(|x| x.to_string())?;
            }
        }
        transaction.commit().map_err(|x| x.to_string())?;

        log::info!("Inserted {} chains", layout.chains().len());
        Ok(())
    }
}

//-----------------------------------------------------------------------------

/// Database queries over a [`LayoutBase`].
///
/// # Examples
///
/// ```
/// use poagraph_view::{utils, viewport, ColumnRange, LayoutBase, LayoutInterface, LayoutParams};
/// use simple_sds::serialize;
/// use std::fs;
///
/// let json_file = utils::get_test_data("example.json");
/// let db_file = serialize::temp_file_name("layout-interface");
/// LayoutBase::create_from_file(&json_file, &db_file, &LayoutParams::default()).unwrap();
/// let database = LayoutBase::open(&db_file).unwrap();
/// let mut interface = LayoutInterface::new(&database).unwrap();
///
/// // Windows from the database match the in-memory layout.
/// let layout = interface.load_layout().unwrap();
/// let range = Some(ColumnRange::new(2, 4));
/// let window = interface.viewport(range).unwrap();
/// assert_eq!(window, viewport::select(&layout, range));
/// assert!(!window.is_empty());
///
/// drop(interface);
/// drop(database);
/// fs::remove_file(&db_file).unwrap();
/// ```
#[derive(Debug)]
pub struct LayoutInterface<'a> {
    get_tag: Statement<'a>,
    get_node: Statement<'a>,
    get_edges: Statement<'a>,
    id_bounds: Statement<'a>,
    nodes_in_range: Statement<'a>,
    edges_in_range: Statement<'a>,
    all_nodes: Statement<'a>,
    all_edges: Statement<'a>,
    all_chains: Statement<'a>,
    key: DatasetKey,
    max_column: Option<usize>,
}

// Columns of the Nodes table in the order used by the queries.
const NODE_COLUMNS: &str = "id, column_id, x, y, aligned_to, label, chain";

// Joins each edge with the chains of its endpoints for classification.
const EDGE_QUERY: &str = "SELECT e.source, e.target, e.kind, e.sequences, s.chain, t.chain
    FROM Edges AS e
    JOIN Nodes AS s ON s.id = e.source
    JOIN Nodes AS t ON t.id = e.target";

// An edge row with the chains of its endpoints.
struct EdgeRow {
    edge: GraphEdge,
    source_chain: Option<usize>,
    target_chain: Option<usize>,
}

impl EdgeRow {
    fn to_element(&self) -> EdgeElement {
        EdgeElement {
            source_id: self.edge.source_id,
            target_id: self.edge.target_id,
            weight: self.edge.weight(),
            classification: classify_edge(self.edge.kind, self.source_chain, self.target_chain),
        }
    }
}

impl<'a> LayoutInterface<'a> {
    /// Returns a new interface to the given database.
    ///
    /// Passes through any database errors.
    pub fn new(database: &'a LayoutBase) -> Result<Self, String> {
        let get_tag = database.connection.prepare(
            "SELECT value FROM Tags WHERE key = ?1"
        ).map_err(|x| x.to_string())?;

        let get_node = database.connection.prepare(
            &format!("SELECT {} FROM Nodes WHERE id = ?1", NODE_COLUMNS)
        ).map_err(|x| x.to_string())?;

        let get_edges = database.connection.prepare(
            &format!("{} WHERE e.source = ?1 ORDER BY e.rank", EDGE_QUERY)
        ).map_err(|x| x.to_string())?;

        let id_bounds = database.connection.prepare(
            "SELECT MIN(id), MAX(id) FROM Nodes WHERE column_id BETWEEN ?1 AND ?2"
        ).map_err(|x| x.to_string())?;

        let nodes_in_range = database.connection.prepare(
            &format!("SELECT {} FROM Nodes WHERE id BETWEEN ?1 AND ?2 ORDER BY id", NODE_COLUMNS)
        ).map_err(|x| x.to_string())?;

        let edges_in_range = database.connection.prepare(
            &format!("{} WHERE e.source BETWEEN ?1 AND ?2 ORDER BY e.source, e.rank", EDGE_QUERY)
        ).map_err(|x| x.to_string())?;

        let all_nodes = database.connection.prepare(
            &format!("SELECT {} FROM Nodes ORDER BY column_id, slot", NODE_COLUMNS)
        ).map_err(|x| x.to_string())?;

        let all_edges = database.connection.prepare(
            &format!("{} ORDER BY e.source, e.rank", EDGE_QUERY)
        ).map_err(|x| x.to_string())?;

        let all_chains = database.connection.prepare(
            "SELECT nodes FROM Chains ORDER BY id"
        ).map_err(|x| x.to_string())?;

        Ok(LayoutInterface {
            get_tag,
            get_node, get_edges,
            id_bounds, nodes_in_range, edges_in_range,
            all_nodes, all_edges, all_chains,
            key: database.key(),
            max_column: database.max_column(),
        })
    }

    /// Returns the value of the tag with the given key, or [`None`] if the tag does not exist.
    pub fn get_tag(&mut self, key: &str) -> Result<Option<String>, String> {
        self.get_tag.query_row(
            (key,),
            |row| row.get(0)
        ).optional().map_err(|x| x.to_string())
    }

    // Reads a node row in NODE_COLUMNS order.
    fn row_to_node(row: &Row) -> rusqlite::Result<(usize, LaidOutNode)> {
        let id: usize = row.get(0)?;
        let node = LaidOutNode {
            column_id: row.get(1)?,
            x: row.get(2)?,
            y: row.get(3)?,
            aligned_to_id: row.get(4)?,
            label: row.get(5)?,
            chain: row.get(6)?,
        };
        Ok((id, node))
    }

    fn node_to_element(node_id: usize, node: LaidOutNode) -> NodeElement {
        let classification = node.classification();
        NodeElement {
            id: node_id,
            label: node.label,
            x: node.x,
            y: node.y,
            aligned_to_id: node.aligned_to_id,
            column_id: node.column_id,
            classification,
        }
    }

    // Reads an edge row from EDGE_QUERY.
    fn row_to_edge(row: &Row) -> Result<EdgeRow, String> {
        let source_id: usize = row.get(0).map_err(|x| x.to_string())?;
        let target_id: usize = row.get(1).map_err(|x| x.to_string())?;
        let code: i64 = row.get(2).map_err(|x| x.to_string())?;
        let kind = EdgeKind::from_code(code).ok_or(
            format!("Invalid edge kind {} for edge {} -> {}", code, source_id, target_id)
        )?;
        let sequences: String = row.get(3).map_err(|x| x.to_string())?;
        let sequence_ids: Vec<usize> = serde_json::from_str(&sequences).map_err(|x| x.to_string())?;
        let source_chain: Option<usize> = row.get(4).map_err(|x| x.to_string())?;
        let target_chain: Option<usize> = row.get(5).map_err(|x| x.to_string())?;
        Ok(EdgeRow {
            edge: GraphEdge { source_id, target_id, sequence_ids, kind },
            source_chain, target_chain,
        })
    }

    /// Returns the node with the given identifier, or [`None`] if there is no such node.
    pub fn get_node(&mut self, node_id: usize) -> Result<Option<LaidOutNode>, String> {
        let result = self.get_node.query_row((node_id,), Self::row_to_node).optional().map_err(|x| x.to_string())?;
        Ok(result.map(|(_, node)| node))
    }

    /// Returns the outgoing edges of the node in their original order.
    ///
    /// Returns an empty list if there is no such node.
    pub fn outgoing(&mut self, node_id: usize) -> Result<Vec<GraphEdge>, String> {
        let mut result = Vec::new();
        let mut rows = self.get_edges.query((node_id,)).map_err(|x| x.to_string())?;
        while let Some(row) = rows.next().map_err(|x| x.to_string())? {
            result.push(Self::row_to_edge(row)?.edge);
        }
        Ok(result)
    }

    /// Returns the smallest and the largest node identifier in the column range, or [`None`] if the range contains no nodes.
    ///
    /// Columns past the end are ignored.
    pub fn id_bounds(&mut self, range: ColumnRange) -> Result<Option<(usize, usize)>, String> {
        // SQLite integers cannot hold every usize, so the range is clamped to the stored columns.
        let max_column = match self.max_column {
            Some(max_column) => max_column,
            None => return Ok(None),
        };
        if range.is_empty() || range.start > max_column {
            return Ok(None);
        }
        let end = range.end.min(max_column);
        let bounds: (Option<usize>, Option<usize>) = self.id_bounds.query_row(
            (range.start, end),
            |row| Ok((row.get(0)?, row.get(1)?))
        ).map_err(|x| x.to_string())?;
        match bounds {
            (Some(low), Some(high)) => Ok(Some((low, high))),
            _ => Ok(None),
        }
    }

    /// Selects the nodes and edges for the column range.
    ///
    /// The result is the same as [`viewport::select`] on the layout stored in the database.
    /// Uses the default range if no range is given.
    pub fn viewport(&mut self, range: Option<ColumnRange>) -> Result<Viewport, String> {
        let range = match viewport::resolve_range(self.max_column, range) {
            Some(range) => range,
            None => return Ok(Viewport::empty(range.unwrap_or(ColumnRange::new(0, 0)))),
        };
        let (first, last) = match self.id_bounds(range)? {
            Some(bounds) => bounds,
            None => return Ok(Viewport::empty(range)),
        };

        let mut nodes: Vec<NodeElement> = Vec::with_capacity(last + 1 - first);
        let mut rows = self.nodes_in_range.query((first, last)).map_err(|x| x.to_string())?;
        while let Some(row) = rows.next().map_err(|x| x.to_string())? {
            let (node_id, node) = Self::row_to_node(row).map_err(|x| x.to_string())?;
            nodes.push(Self::node_to_element(node_id, node));
        }

        let mut edges: Vec<EdgeElement> = Vec::new();
        let mut rows = self.edges_in_range.query((first, last)).map_err(|x| x.to_string())?;
        while let Some(row) = rows.next().map_err(|x| x.to_string())? {
            edges.push(Self::row_to_edge(row)?.to_element());
        }

        log::debug!("Viewport {}: {} nodes, {} edges", range, nodes.len(), edges.len());
        Ok(Viewport { range, nodes, edges })
    }

    /// Loads the entire layout into memory.
    ///
    /// The result is equal to the layout the database was created from.
    /// It can be inserted into an [`crate::ElementCache`] under [`LayoutInterface::key`].
    pub fn load_layout(&mut self) -> Result<CachedLayout, String> {
        let mut nodes: Vec<Option<LaidOutNode>> = Vec::new();
        let mut column_index = ColumnIndex::new();
        let mut rows = self.all_nodes.query(()).map_err(|x| x.to_string())?;
        while let Some(row) = rows.next().map_err(|x| x.to_string())? {
            let (node_id, node) = Self::row_to_node(row).map_err(|x| x.to_string())?;
            column_index.push(node.column_id, node_id);
            if node_id >= nodes.len() {
                nodes.resize(node_id + 1, None);
            }
            nodes[node_id] = Some(node);
        }
        let nodes: Vec<LaidOutNode> = nodes.into_iter().enumerate().map(|(node_id, node)| {
            node.ok_or(format!("Node {} is missing from the database", node_id))
        }).collect::<Result<_, _>>()?;

        let mut edges: Vec<Vec<GraphEdge>> = vec![Vec::new(); nodes.len()];
        let mut rows = self.all_edges.query(()).map_err(|x| x.to_string())?;
        while let Some(row) = rows.next().map_err(|x| x.to_string())? {
            let edge = Self::row_to_edge(row)?.edge;
            let list = edges.get_mut(edge.source_id).ok_or(
                format!("Edge source {} is not a node", edge.source_id)
            )?;
            list.push(edge);
        }

        let mut chains: Vec<Vec<usize>> = Vec::new();
        let mut rows = self.all_chains.query(()).map_err(|x| x.to_string())?;
        while let Some(row) = rows.next().map_err(|x| x.to_string())? {
            let chain: String = row.get(0).map_err(|x| x.to_string())?;
            chains.push(serde_json::from_str(&chain).map_err(|x| x.to_string())?);
        }

        Ok(CachedLayout::from_parts(self.key, nodes, edges, column_index, chains))
    }

    /// Returns the key of the dataset the layout was built from.
    pub fn key(&self) -> DatasetKey {
        self.key
    }
}

//-----------------------------------------------------------------------------

// Executes the statement, which is expected to return a single string value.
// Then returns the value.
fn get_string_value(statement: &mut Statement, key: &str) -> Result<String, String> {
    let result: rusqlite::Result<String> = statement.query_row(
        (key,),
        |row| row.get(0)
    );
    match result {
        Ok(value) => Ok(value),
        Err(x) => Err(format!("Key not found: {} ({})", key, x)),
    }
}

// Executes the statement, which is expected to return a single string value.
// Then returns the value as an integer.
fn get_numeric_value(statement: &mut Statement, key: &str) -> Result<usize, String> {
    let value = get_string_value(statement, key)?;
    value.parse::<usize>().map_err(|x| x.to_string())
}

//-----------------------------------------------------------------------------
