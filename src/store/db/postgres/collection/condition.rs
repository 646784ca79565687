use sea_query::{ColumnDef, Expr as SeaExpr, Iden, PostgresQueryBuilder, Query as SeaQuery, Table};
use sea_query_binder::SqlxBinder;
use sqlx::{Error as DbError, Row, postgres::PgRow};
use tracing::trace;

use crate::{
    Result, TaskflowError,
    store::{
        DbCollection, PageData, data,
        db::postgres::{DbInit, DbRow},
        query,
    },
};

use super::{DbConnection, fetch_page, map_db_err, row_exists};

#[derive(Debug)]
pub struct ConditionCollection {
    conn: DbConnection,
}

#[derive(Iden, Clone, Copy)]
#[iden = "act_task_condition"]
enum CollectionIden {
    Table,

    Id,
    Operator,
    ConditionType,
    Value,
    Desc,
}

const COLUMNS: [CollectionIden; 5] = [CollectionIden::Id, CollectionIden::Operator, CollectionIden::ConditionType, CollectionIden::Value, CollectionIden::Desc];

/// Condition ids are numeric; anything else cannot match a row.
fn parse_id(id: &str) -> Result<i64> {
    id.trim().parse::<i64>().map_err(|_| TaskflowError::NotFound(format!("act_task_condition '{}'", id)))
}

impl DbCollection for ConditionCollection {
    type Item = data::TaskCondition;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        match parse_id(id) {
            Ok(id) => row_exists(&self.conn, CollectionIden::Table, CollectionIden::Id, id),
            Err(_) => Ok(false),
        }
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        trace!("act_task_condition::find({})", id);
        let (sql, values) = SeaQuery::select()
            .from(CollectionIden::Table)
            .columns(COLUMNS)
            .and_where(SeaExpr::col(CollectionIden::Id).eq(parse_id(id)?))
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
        trace!("act_task_condition::create({})", data.id);
        let m = data.clone();
        let (sql, sql_values) = SeaQuery::insert()
            .into_table(CollectionIden::Table)
            .columns(COLUMNS)
            .values([m.id.into(), m.operator.into(), m.condition_type.into(), m.value.into(), m.desc.into()])
            .map_err(map_db_err)?
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        trace!("act_task_condition::update({})", data.id);
        let m = data.clone();
        let (sql, sql_values) = SeaQuery::update()
            .table(CollectionIden::Table)
            .values([
                (CollectionIden::Operator, m.operator.into()),
                (CollectionIden::ConditionType, m.condition_type.into()),
                (CollectionIden::Value, m.value.into()),
                (CollectionIden::Desc, m.desc.into()),
            ])
            .and_where(SeaExpr::col(CollectionIden::Id).eq(m.id))
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        trace!("act_task_condition::delete({})", id);
        let Ok(id) = parse_id(id) else {
            return Ok(false);
        };
        let (sql, values) =
            SeaQuery::delete().from_table(CollectionIden::Table).and_where(SeaExpr::col(CollectionIden::Id).eq(id)).build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

impl DbRow for data::TaskCondition {
    fn id(&self) -> String {
        self.key()
    }

    fn from_row(row: &PgRow) -> std::result::Result<Self, DbError>
    where
        Self: Sized,
    {
        Ok(Self {
            id: row.try_get("id")?,
            operator: row.try_get("operator")?,
            condition_type: row.try_get("condition_type")?,
            value: row.try_get("value")?,
            desc: row.try_get("desc")?,
        })
    }
}

impl DbInit for ConditionCollection {
    fn init(&self) -> Result<()> {
        let sql = [Table::create()
            .table(CollectionIden::Table)
            .if_not_exists()
            .col(ColumnDef::new(CollectionIden::Id).big_integer().not_null().primary_key())
            .col(ColumnDef::new(CollectionIden::Operator).string().not_null())
            .col(ColumnDef::new(CollectionIden::ConditionType).string().not_null().default(""))
            .col(ColumnDef::new(CollectionIden::Value).text().not_null().default(""))
            .col(ColumnDef::new(CollectionIden::Desc).text().not_null().default(""))
            .build(PostgresQueryBuilder)];

        self.conn.batch_execute(&sql).map_err(map_db_err)
    }
}

impl ConditionCollection {
    pub fn new(conn: &DbConnection) -> Self {
        Self {
            conn: conn.clone(),
        }
    }
}
