mod condition;
mod flow;
mod task_type;

use std::sync::Arc;

use sea_query::{
    Alias as SeaAlias, Condition, ConditionExpression, Expr as SeaExpr, Func as SeaFunc, Iden, LikeExpr, Order as SeaOrder, PostgresQueryBuilder, Query as SeaQuery,
    Value as SeaValue,
};
use sea_query_binder::SqlxBinder;
use sqlx::Row;
use serde_json::Value as JsonValue;

pub use condition::ConditionCollection;
pub use flow::FlowCollection;
pub use task_type::TaskTypeCollection;

use crate::{
    Result,
    store::{
        PageData, map_db_err,
        query::{Expr, Query},
    },
};

use super::{DbRow, synclient::SynClient};

pub type DbConnection = Arc<SynClient>;

fn into_value(value: &JsonValue) -> SeaValue {
    match value {
        JsonValue::Bool(b) => (*b).into(),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().unwrap_or_default().into(),
        },
        JsonValue::String(s) => s.clone().into(),
        other => other.to_string().into(),
    }
}

/// `%text%` with the LIKE wildcards in `text` escaped by `\`.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn into_expr(expr: &Expr) -> ConditionExpression {
    match expr {
        Expr::Eq(key, value) => SeaExpr::col(SeaAlias::new(key)).eq(into_value(value)).into(),
        Expr::Contains(key, text) => SeaExpr::col(SeaAlias::new(key)).like(LikeExpr::new(like_pattern(text)).escape('\\')).into(),
        Expr::Or(exprs) => exprs.iter().fold(Condition::any(), |cond, e| cond.add(into_expr(e))).into(),
    }
}

/// Translates the query filters into an AND condition.
pub fn into_query(q: &Query) -> Condition {
    q.filters().iter().fold(Condition::all(), |cond, e| cond.add(into_expr(e)))
}

/// Counts and loads one page of `table` for the query.
pub fn fetch_page<T, I>(
    conn: &DbConnection,
    table: I,
    id: I,
    columns: &[I],
    q: &Query,
) -> Result<PageData<T>>
where
    T: DbRow,
    I: Iden + Copy + 'static,
{
    let filter = into_query(q);

    let mut count_query = SeaQuery::select();
    count_query.from(table).expr(SeaFunc::count(SeaExpr::col(id)));

    let mut query = SeaQuery::select();
    query.columns(columns.iter().copied()).from(table);

    if !filter.is_empty() {
        count_query.cond_where(filter.clone());
        query.cond_where(filter);
    }

    for (order, rev) in q.order_by().iter() {
        query.order_by(
            SeaAlias::new(order),
            if *rev {
                SeaOrder::Desc
            } else {
                SeaOrder::Asc
            },
        );
    }
    let (sql, values) = query.limit(q.limit() as u64).offset(q.offset() as u64).build_sqlx(PostgresQueryBuilder);

    let (count_sql, count_values) = count_query.build_sqlx(PostgresQueryBuilder);
    let count = conn.query_one(count_sql.as_str(), count_values).map_err(map_db_err)?.get::<i64, usize>(0) as usize;
    let rows = conn.query(&sql, values).map_err(map_db_err)?.iter().map(T::from_row).collect::<std::result::Result<Vec<_>, _>>().map_err(map_db_err)?;

    Ok(PageData {
        count,
        page_size: q.limit(),
        page_num: q.offset() / q.limit() + 1,
        page_count: count.div_ceil(q.limit()),
        rows,
    })
}

/// Whether a row with `id` exists in `table`.
pub fn row_exists<I, V>(
    conn: &DbConnection,
    table: I,
    id_col: I,
    id: V,
) -> Result<bool>
where
    I: Iden + Copy + 'static,
    V: Into<SeaValue>,
{
    let (sql, values) =
        SeaQuery::select().from(table).expr(SeaFunc::count(SeaExpr::col(id_col))).and_where(SeaExpr::col(id_col).eq(id.into())).build_sqlx(PostgresQueryBuilder);

    let count = conn.query_one(sql.as_str(), values).map(|row| row.get::<i64, usize>(0)).map_err(map_db_err)?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("daily"), "%daily%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }
}
