use sea_query::{ColumnDef, Expr as SeaExpr, Iden, PostgresQueryBuilder, Query as SeaQuery, Table};
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
pub struct TaskTypeCollection {
    conn: DbConnection,
}

#[derive(Iden, Clone, Copy)]
#[iden = "act_task_type"]
enum CollectionIden {
    Table,

    Value,
    #[iden = "type"]
    Kind,
    Desc,
    Mark,
    ClassName,
    Inheritance,
    Include,
    Exclude,
    Require,
    RequireField,
    PreRequireField,
    SubRequireField,
}

const COLUMNS: [CollectionIden; 12] = [
    CollectionIden::Value,
    CollectionIden::Kind,
    CollectionIden::Desc,
    CollectionIden::Mark,
    CollectionIden::ClassName,
    CollectionIden::Inheritance,
    CollectionIden::Include,
    CollectionIden::Exclude,
    CollectionIden::Require,
    CollectionIden::RequireField,
    CollectionIden::PreRequireField,
    CollectionIden::SubRequireField,
];

impl DbCollection for TaskTypeCollection {
    type Item = data::TaskType;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        row_exists(&self.conn, CollectionIden::Table, CollectionIden::Value, id)
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        trace!("act_task_type::find({})", id);
        let (sql, values) = SeaQuery::select()
            .from(CollectionIden::Table)
            .columns(COLUMNS)
            .and_where(SeaExpr::col(CollectionIden::Value).eq(id))
            .build_sqlx(PostgresQueryBuilder);
        let row = self.conn.query_one(&sql, values).map_err(map_db_err)?;
        Self::Item::from_row(&row).map_err(map_db_err)
    }

    fn query(
        &self,
        q: &query::Query,
    ) -> Result<PageData<Self::Item>> {
        fetch_page(&self.conn, CollectionIden::Table, CollectionIden::Value, &COLUMNS, q)
    }

    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        trace!("act_task_type::create({})", data.value);
        let m = data.clone();
        let (sql, sql_values) = SeaQuery::insert()
            .into_table(CollectionIden::Table)
            .columns(COLUMNS)
            .values([
                m.value.into(),
                m.kind.into(),
                m.desc.into(),
                m.mark.into(),
                m.class_name.into(),
                m.inheritance.into(),
                m.include.into(),
                m.exclude.into(),
                m.require.into(),
                m.require_field.into(),
                m.pre_require_field.into(),
                m.sub_require_field.into(),
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
        trace!("act_task_type::update({})", data.value);
        let m = data.clone();
        let (sql, sql_values) = SeaQuery::update()
            .table(CollectionIden::Table)
            .values([
                (CollectionIden::Kind, m.kind.into()),
                (CollectionIden::Desc, m.desc.into()),
                (CollectionIden::Mark, m.mark.into()),
                (CollectionIden::ClassName, m.class_name.into()),
                (CollectionIden::Inheritance, m.inheritance.into()),
                (CollectionIden::Include, m.include.into()),
                (CollectionIden::Exclude, m.exclude.into()),
                (CollectionIden::Require, m.require.into()),
                (CollectionIden::RequireField, m.require_field.into()),
                (CollectionIden::PreRequireField, m.pre_require_field.into()),
                (CollectionIden::SubRequireField, m.sub_require_field.into()),
            ])
            .and_where(SeaExpr::col(CollectionIden::Value).eq(data.id()))
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        trace!("act_task_type::delete({})", id);
        let (sql, values) =
            SeaQuery::delete().from_table(CollectionIden::Table).and_where(SeaExpr::col(CollectionIden::Value).eq(id)).build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

impl DbRow for data::TaskType {
    fn id(&self) -> String {
        self.value.clone()
    }

    fn from_row(row: &PgRow) -> std::result::Result<Self, DbError>
    where
        Self: Sized,
    {
        Ok(Self {
            value: row.try_get("value")?,
            kind: row.try_get("type")?,
            desc: row.try_get("desc")?,
            mark: row.try_get("mark")?,
            class_name: row.try_get("class_name")?,
            inheritance: row.try_get("inheritance")?,
            include: row.try_get("include")?,
            exclude: row.try_get("exclude")?,
            require: row.try_get("require")?,
            require_field: row.try_get("require_field")?,
            pre_require_field: row.try_get("pre_require_field")?,
            sub_require_field: row.try_get("sub_require_field")?,
        })
    }
}

impl DbInit for TaskTypeCollection {
    fn init(&self) -> Result<()> {
        let list = |iden| ColumnDef::new(iden).text().not_null().default("[]").to_owned();
        let sql = [Table::create()
            .table(CollectionIden::Table)
            .if_not_exists()
            .col(ColumnDef::new(CollectionIden::Value).string().not_null().primary_key())
            .col(ColumnDef::new(CollectionIden::Kind).string().not_null().default(""))
            .col(ColumnDef::new(CollectionIden::Desc).text().not_null().default(""))
            .col(ColumnDef::new(CollectionIden::Mark).string().not_null().default(""))
            .col(ColumnDef::new(CollectionIden::ClassName).string().not_null().default(""))
            .col(list(CollectionIden::Inheritance))
            .col(list(CollectionIden::Include))
            .col(list(CollectionIden::Exclude))
            .col(list(CollectionIden::Require))
            .col(list(CollectionIden::RequireField))
            .col(list(CollectionIden::PreRequireField))
            .col(list(CollectionIden::SubRequireField))
            .build(PostgresQueryBuilder)];

        self.conn.batch_execute(&sql).map_err(map_db_err)
    }
}

impl TaskTypeCollection {
    pub fn new(conn: &DbConnection) -> Self {
        Self {
            conn: conn.clone(),
        }
    }
}
