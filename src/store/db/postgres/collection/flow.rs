use sea_query::{ColumnDef, Expr as SeaExpr, Iden, Index, PostgresQueryBuilder, Query as SeaQuery, Table};
use sea_query_binder::SqlxBinder;
use sqlx::{Error as DbError, Row, postgres::PgRow};
use tracing::trace;

use crate::{
    Result,
    store::{
        DbCollection, PageData, data,
        db::postgres::{DbInit, DbRow},
        query,
    },
};

use super::{DbConnection, fetch_page, map_db_err, row_exists};

#[derive(Debug)]
pub struct FlowCollection {
    conn: DbConnection,
}

#[derive(Iden, Clone, Copy)]
#[iden = "act_task_flow"]
enum CollectionIden {
    Table,

    Id,
    Title,
    Description,
    Nodes,
    Edges,
    CreateTime,
    UpdateTime,
}

const COLUMNS: [CollectionIden; 7] = [
    CollectionIden::Id,
    CollectionIden::Title,
    CollectionIden::Description,
    CollectionIden::Nodes,
    CollectionIden::Edges,
    CollectionIden::CreateTime,
    CollectionIden::UpdateTime,
];

impl DbCollection for FlowCollection {
    type Item = data::TaskFlow;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        row_exists(&self.conn, CollectionIden::Table, CollectionIden::Id, id)
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        trace!("act_task_flow::find({})", id);
        let (sql, values) = SeaQuery::select()
            .from(CollectionIden::Table)
            .columns(COLUMNS)
            .and_where(SeaExpr::col(CollectionIden::Id).eq(id))
            .build_sqlx(PostgresQueryBuilder);
        let row = self.conn.query_one(&sql, values).map_err(map_db_err)?;
        Self::Item::from_row(&row).map_err(map_db_err)
    }

    fn query(
        &self,
        q: &query::Query,
    ) -> Result<PageData<Self::Item>> {
        fetch_page(&self.conn, CollectionIden::Table, CollectionIden::Id, &COLUMNS, q)
    }

    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        trace!("act_task_flow::create({})", data.id);
        let nodes = serde_json::to_string(&data.nodes)?;
        let edges = serde_json::to_string(&data.edges)?;
        let (sql, sql_values) = SeaQuery::insert()
            .into_table(CollectionIden::Table)
            .columns(COLUMNS)
            .values([
                data.id.clone().into(),
                data.title.clone().into(),
                data.description.clone().into(),
                nodes.into(),
                edges.into(),
                data.create_time.into(),
                data.update_time.into(),
            ])
            .map_err(map_db_err)?
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        trace!("act_task_flow::update({})", data.id);
        let nodes = serde_json::to_string(&data.nodes)?;
        let edges = serde_json::to_string(&data.edges)?;
        let (sql, sql_values) = SeaQuery::update()
            .table(CollectionIden::Table)
            .values([
                (CollectionIden::Title, data.title.clone().into()),
                (CollectionIden::Description, data.description.clone().into()),
                (CollectionIden::Nodes, nodes.into()),
                (CollectionIden::Edges, edges.into()),
                (CollectionIden::CreateTime, data.create_time.into()),
                (CollectionIden::UpdateTime, data.update_time.into()),
            ])
            .and_where(SeaExpr::col(CollectionIden::Id).eq(data.id()))
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        trace!("act_task_flow::delete({})", id);
        let (sql, values) =
            SeaQuery::delete().from_table(CollectionIden::Table).and_where(SeaExpr::col(CollectionIden::Id).eq(id)).build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

impl DbRow for data::TaskFlow {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn from_row(row: &PgRow) -> std::result::Result<Self, DbError>
    where
        Self: Sized,
    {
        let nodes: String = row.try_get("nodes")?;
        let edges: String = row.try_get("edges")?;
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            nodes: serde_json::from_str(&nodes).map_err(|e| DbError::Decode(Box::new(e)))?,
            edges: serde_json::from_str(&edges).map_err(|e| DbError::Decode(Box::new(e)))?,
            create_time: row.try_get("create_time")?,
            update_time: row.try_get("update_time")?,
        })
    }
}

impl DbInit for FlowCollection {
    fn init(&self) -> Result<()> {
        let sql = [
            Table::create()
                .table(CollectionIden::Table)
                .if_not_exists()
                .col(ColumnDef::new(CollectionIden::Id).string().not_null().primary_key())
                .col(ColumnDef::new(CollectionIden::Title).string().not_null())
                .col(ColumnDef::new(CollectionIden::Description).text().default(""))
                .col(ColumnDef::new(CollectionIden::Nodes).text().not_null())
                .col(ColumnDef::new(CollectionIden::Edges).text().not_null())
                .col(ColumnDef::new(CollectionIden::CreateTime).big_integer().default(0))
                .col(ColumnDef::new(CollectionIden::UpdateTime).big_integer().default(0))
                .build(PostgresQueryBuilder),
            Index::create().name("idx_act_task_flow_title").if_not_exists().table(CollectionIden::Table).col(CollectionIden::Title).build(PostgresQueryBuilder),
        ];

        self.conn.batch_execute(&sql).map_err(map_db_err)
    }
}

impl FlowCollection {
    pub fn new(conn: &DbConnection) -> Self {
        Self {
            conn: conn.clone(),
        }
    }
}
