use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Pool, Postgres, QueryBuilder};

use crate::database::{DatabaseError, Filter, PageRequest, PagedResult, QuerySource, Result};
use crate::errors::PageError;
use crate::utils::validation;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A value bound as a query parameter, never spliced into the SQL text
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    ILike,
}

impl Comparison {
    fn as_sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Like => "LIKE",
            Comparison::ILike => "ILIKE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: String,
        op: Comparison,
        value: SqlValue,
    },
    IsNull(String),
    IsNotNull(String),
    In {
        column: String,
        values: Vec<SqlValue>,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn compare(column: impl Into<String>, op: Comparison, value: impl Into<SqlValue>) -> Self {
        Condition::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Ne, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Lt, value)
    }

    pub fn le(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Le, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Gt, value)
    }

    pub fn ge(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Ge, value)
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(column, Comparison::Like, pattern.into())
    }

    pub fn ilike(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(column, Comparison::ILike, pattern.into())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Condition::IsNull(column.into())
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Condition::IsNotNull(column.into())
    }

    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }

    /// An empty list matches no rows
    pub fn is_in<V>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<SqlValue>,
    {
        Condition::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A composable SQL condition, empty until the first `and`/`or`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlPredicate {
    root: Option<Condition>,
}

impl SqlPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.root.is_some()
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.root.as_ref()
    }

    pub fn and(self, condition: Condition) -> Self {
        let root = match self.root {
            Some(root) => Condition::And(Box::new(root), Box::new(condition)),
            None => condition,
        };
        Self { root: Some(root) }
    }

    pub fn or(self, condition: Condition) -> Self {
        let root = match self.root {
            Some(root) => Condition::Or(Box::new(root), Box::new(condition)),
            None => condition,
        };
        Self { root: Some(root) }
    }

    pub fn not(self) -> Self {
        Self {
            root: self.root.map(|root| Condition::Not(Box::new(root))),
        }
    }

    pub fn into_filter(self) -> Filter<Self> {
        self.into()
    }
}

impl From<Condition> for SqlPredicate {
    fn from(condition: Condition) -> Self {
        Self {
            root: Some(condition),
        }
    }
}

impl From<SqlPredicate> for Filter<SqlPredicate> {
    fn from(predicate: SqlPredicate) -> Self {
        if predicate.is_started() {
            Filter::Where(predicate)
        } else {
            Filter::None
        }
    }
}

/// The table, base condition and ordering a page is cut from.
///
/// The base condition from [`scope`](Self::scope) applies to every query and
/// is ANDed with the per-call filter. Identifiers are checked against a strict
/// pattern when SQL is rendered, so a bad name surfaces as
/// [`DatabaseError::InvalidIdentifier`] from the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    table: String,
    columns: Vec<String>,
    scope: SqlPredicate,
    order_by: Vec<(String, SortDirection)>,
}

impl SqlQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            scope: SqlPredicate::new(),
            order_by: Vec::new(),
        }
    }

    /// Columns to select, `*` when none are given
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict every count and page to rows matching `condition`.
    /// Repeated calls AND together.
    pub fn scope(mut self, condition: Condition) -> Self {
        self.scope = self.scope.and(condition);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by.push((column.into(), direction));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_ordered(&self) -> bool {
        !self.order_by.is_empty()
    }

    pub fn count_sql(
        &self,
        filter: &Filter<SqlPredicate>,
    ) -> Result<QueryBuilder<'static, Postgres>> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM ");
        qb.push(table_name(&self.table)?);
        self.push_where(&mut qb, filter)?;

        Ok(qb)
    }

    pub fn page_sql(
        &self,
        filter: &Filter<SqlPredicate>,
        offset: i64,
        limit: i64,
    ) -> Result<QueryBuilder<'static, Postgres>> {
        let mut qb = QueryBuilder::new("SELECT ");

        if self.columns.is_empty() {
            qb.push("*");
        } else {
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                qb.push(column_name(column)?);
            }
        }

        qb.push(" FROM ").push(table_name(&self.table)?);
        self.push_where(&mut qb, filter)?;

        for (i, (column, direction)) in self.order_by.iter().enumerate() {
            qb.push(if i == 0 { " ORDER BY " } else { ", " });
            qb.push(column_name(column)?).push(" ").push(direction.as_sql());
        }

        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);

        Ok(qb)
    }

    fn push_where(
        &self,
        qb: &mut QueryBuilder<'static, Postgres>,
        filter: &Filter<SqlPredicate>,
    ) -> Result<()> {
        let scope = self.scope.condition();
        let filter = filter.predicate().and_then(SqlPredicate::condition);

        match (scope, filter) {
            (Some(scope), Some(filter)) => {
                qb.push(" WHERE (");
                push_condition(qb, scope)?;
                qb.push(" AND ");
                push_condition(qb, filter)?;
                qb.push(")");
            }
            (Some(condition), None) | (None, Some(condition)) => {
                qb.push(" WHERE ");
                push_condition(qb, condition)?;
            }
            (None, None) => {}
        }

        Ok(())
    }
}

fn table_name(table: &str) -> Result<&str> {
    if validation::is_valid_qualified_identifier(table) {
        Ok(table)
    } else {
        Err(DatabaseError::InvalidIdentifier(table.to_owned()))
    }
}

fn column_name(column: &str) -> Result<&str> {
    if validation::is_valid_identifier(column) {
        Ok(column)
    } else {
        Err(DatabaseError::InvalidIdentifier(column.to_owned()))
    }
}

fn push_condition(qb: &mut QueryBuilder<'static, Postgres>, condition: &Condition) -> Result<()> {
    match condition {
        Condition::Compare { column, op, value } => {
            qb.push(column_name(column)?).push(" ").push(op.as_sql()).push(" ");
            push_value(qb, value);
        }
        Condition::IsNull(column) => {
            qb.push(column_name(column)?).push(" IS NULL");
        }
        Condition::IsNotNull(column) => {
            qb.push(column_name(column)?).push(" IS NOT NULL");
        }
        Condition::In { column, values } => {
            let column = column_name(column)?;
            if values.is_empty() {
                qb.push("FALSE");
            } else {
                qb.push(column).push(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    push_value(qb, value);
                }
                qb.push(")");
            }
        }
        Condition::And(lhs, rhs) => {
            qb.push("(");
            push_condition(qb, lhs)?;
            qb.push(" AND ");
            push_condition(qb, rhs)?;
            qb.push(")");
        }
        Condition::Or(lhs, rhs) => {
            qb.push("(");
            push_condition(qb, lhs)?;
            qb.push(" OR ");
            push_condition(qb, rhs)?;
            qb.push(")");
        }
        Condition::Not(inner) => {
            qb.push("NOT (");
            push_condition(qb, inner)?;
            qb.push(")");
        }
    }

    Ok(())
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &SqlValue) {
    match value {
        SqlValue::Bool(v) => qb.push_bind(*v),
        SqlValue::Int(v) => qb.push_bind(*v),
        SqlValue::Float(v) => qb.push_bind(*v),
        SqlValue::Text(v) => qb.push_bind(v.clone()),
    };
}

/// Pages rows of `T` out of a Postgres table
#[derive(Debug, Clone)]
pub struct SqlSource<T> {
    pool: Pool<Postgres>,
    query: SqlQuery,
    _row: PhantomData<fn() -> T>,
}

impl<T> SqlSource<T> {
    pub fn new(pool: Pool<Postgres>, query: SqlQuery) -> Self {
        if !query.is_ordered() {
            tracing::warn!(table = query.table(), "Paging without ORDER BY, pages may overlap");
        }

        Self {
            pool,
            query,
            _row: PhantomData,
        }
    }

    pub fn query(&self) -> &SqlQuery {
        &self.query
    }
}

impl<T> SqlSource<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    /// Count and fetch inside one `REPEATABLE READ` transaction, so the total and
    /// the rows come from the same snapshot.
    #[tracing::instrument(
        skip_all,
        fields(table = self.query.table(), page_index = request.page_index())
    )]
    pub async fn fetch_consistent(
        &self,
        request: PageRequest,
        filter: &Filter<SqlPredicate>,
    ) -> Result<PagedResult<T>, PageError<DatabaseError>> {
        let (total_count, items) = self
            .snapshot(request, filter)
            .await
            .map_err(PageError::Source)?;

        tracing::debug!(total_count, fetched = items.len(), "Materialized page from snapshot");

        Ok(PagedResult::from_parts(items, total_count, request))
    }

    async fn snapshot(
        &self,
        request: PageRequest,
        filter: &Filter<SqlPredicate>,
    ) -> Result<(i64, Vec<T>)> {
        let mut count = self.query.count_sql(filter)?;
        let mut page = self
            .query
            .page_sql(filter, request.offset(), request.page_size())?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let total_count: i64 = count.build_query_scalar().fetch_one(&mut *tx).await?;
        let items: Vec<T> = page.build_query_as().fetch_all(&mut *tx).await?;

        tx.commit().await?;

        Ok((total_count, items))
    }
}

#[async_trait]
impl<T> QuerySource for SqlSource<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
{
    type Item = T;
    type Predicate = SqlPredicate;
    type Error = DatabaseError;

    async fn count(&self, filter: &Filter<SqlPredicate>) -> Result<i64> {
        let mut query = self.query.count_sql(filter)?;
        let total = query.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(total)
    }

    async fn fetch(
        &self,
        filter: &Filter<SqlPredicate>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<T>> {
        let mut query = self.query.page_sql(filter, offset, limit)?;
        let rows = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> SqlQuery {
        SqlQuery::new("users").order_by("id", SortDirection::Asc)
    }

    #[test]
    fn count_without_filter() {
        let qb = users().count_sql(&Filter::None).unwrap();
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM users");
    }

    #[test]
    fn unstarted_predicate_adds_no_where_clause() {
        let filter = SqlPredicate::new().into_filter();
        assert!(filter.is_none());

        let qb = users().count_sql(&filter).unwrap();
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM users");
    }

    #[test]
    fn count_with_combined_conditions() {
        let filter = SqlPredicate::new()
            .and(Condition::eq("active", true))
            .and(Condition::ge("age", 18))
            .into_filter();

        let qb = users().count_sql(&filter).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM users WHERE (active = $1 AND age >= $2)"
        );
    }

    #[test]
    fn page_binds_limit_and_offset_after_the_filter() {
        let filter = SqlPredicate::from(Condition::eq("active", true)).into_filter();

        let qb = users().page_sql(&filter, 20, 10).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM users WHERE active = $1 ORDER BY id ASC LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn page_with_columns_and_several_sort_keys() {
        let query = SqlQuery::new("public.users")
            .columns(["id", "name"])
            .order_by("created_at", SortDirection::Desc)
            .order_by("id", SortDirection::Asc);

        let qb = query.page_sql(&Filter::None, 0, 25).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT id, name FROM public.users ORDER BY created_at DESC, id ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn scope_applies_without_a_filter() {
        let query = users().scope(Condition::is_null("deleted_at"));

        let qb = query.count_sql(&Filter::None).unwrap();
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM users WHERE deleted_at IS NULL");

        let qb = query.page_sql(&Filter::None, 0, 10).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM users WHERE deleted_at IS NULL ORDER BY id ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn scope_and_filter_are_anded() {
        let query = users()
            .scope(Condition::is_null("deleted_at"))
            .scope(Condition::eq("tenant_id", 7));
        let filter = SqlPredicate::new()
            .and(Condition::eq("active", true))
            .or(Condition::eq("role", "admin"))
            .into_filter();

        let qb = query.count_sql(&filter).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM users WHERE ((deleted_at IS NULL AND tenant_id = $1) AND (active = $2 OR role = $3))"
        );

        let qb = query.page_sql(&filter, 40, 20).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM users WHERE ((deleted_at IS NULL AND tenant_id = $1) AND (active = $2 OR role = $3)) ORDER BY id ASC LIMIT $4 OFFSET $5"
        );
    }

    #[test]
    fn scope_identifiers_are_checked() {
        let query = users().scope(Condition::is_null("deleted_at OR 1=1"));
        assert!(matches!(
            query.count_sql(&Filter::None),
            Err(DatabaseError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn renders_every_condition_kind() {
        let filter = SqlPredicate::new()
            .and(Condition::ilike("name", "%ann%"))
            .or(Condition::is_in("role", ["admin", "owner"]))
            .and(Condition::is_not_null("email"))
            .and(Condition::is_null("deleted_at").negate())
            .into_filter();

        let qb = users().count_sql(&filter).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM users WHERE (((name ILIKE $1 OR role IN ($2, $3)) AND email IS NOT NULL) AND NOT (deleted_at IS NULL))"
        );
    }

    #[test]
    fn negated_predicate() {
        let filter = SqlPredicate::new()
            .and(Condition::lt("score", 10))
            .not()
            .into_filter();

        let qb = users().count_sql(&filter).unwrap();
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM users WHERE NOT (score < $1)");
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let filter = SqlPredicate::from(Condition::is_in("id", Vec::<i64>::new())).into_filter();

        let qb = users().count_sql(&filter).unwrap();
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM users WHERE FALSE");
    }

    #[test]
    fn rejects_bad_identifiers() {
        let result = SqlQuery::new("users; DROP TABLE users").count_sql(&Filter::None);
        assert!(matches!(
            result,
            Err(DatabaseError::InvalidIdentifier(t)) if t == "users; DROP TABLE users"
        ));

        let filter = SqlPredicate::from(Condition::eq("name = name OR 1", 1)).into_filter();
        assert!(matches!(
            users().count_sql(&filter),
            Err(DatabaseError::InvalidIdentifier(_))
        ));

        let query = SqlQuery::new("users").order_by("id DESC; --", SortDirection::Asc);
        assert!(matches!(
            query.page_sql(&Filter::None, 0, 10),
            Err(DatabaseError::InvalidIdentifier(_))
        ));

        let query = SqlQuery::new("users").columns(["*"]);
        assert!(matches!(
            query.page_sql(&Filter::None, 0, 10),
            Err(DatabaseError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn values_convert() {
        assert_eq!(SqlValue::from(3), SqlValue::Int(3));
        assert_eq!(SqlValue::from("x"), SqlValue::Text("x".into()));
        assert_eq!(SqlValue::from(1.5), SqlValue::Float(1.5));
        assert_eq!(SqlValue::from(false), SqlValue::Bool(false));
    }
}
