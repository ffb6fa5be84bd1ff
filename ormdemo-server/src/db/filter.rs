//! SQL rendering for `UserFilter`
//!
//! Values are always bound, never spliced into the SQL text. Column names
//! come from this module only.

use sqlx::{Postgres, QueryBuilder};

use crate::models::{IntFilter, StringFilter, UserFilter};

/// Append ` WHERE <filter>` to the builder. An empty filter renders `TRUE`.
pub fn push_where(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    qb.push(" WHERE ");
    push_expr(qb, filter);
}

/// Append the parenthesized boolean expression for `filter`.
pub fn push_expr(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    let mut terms = 0usize;
    qb.push("(");

    if let Some(id) = filter.id {
        and(qb, &mut terms);
        qb.push("id = ").push_bind(id);
    }

    if let Some(head_id) = filter.head_id {
        and(qb, &mut terms);
        qb.push("head_id = ").push_bind(head_id);
    }

    if let Some(name) = &filter.name {
        push_string(qb, &mut terms, "name", name);
    }

    if let Some(age) = &filter.age {
        push_int(qb, &mut terms, "age", age);
    }

    if !filter.or.is_empty() {
        and(qb, &mut terms);
        qb.push("(");
        for (i, alternative) in filter.or.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            push_expr(qb, alternative);
        }
        qb.push(")");
    }

    if let Some(not) = &filter.not {
        and(qb, &mut terms);
        qb.push("NOT ");
        push_expr(qb, not);
    }

    if terms == 0 {
        qb.push("TRUE");
    }
    qb.push(")");
}

fn and(qb: &mut QueryBuilder<'_, Postgres>, terms: &mut usize) {
    if *terms > 0 {
        qb.push(" AND ");
    }
    *terms += 1;
}

fn push_string(
    qb: &mut QueryBuilder<'_, Postgres>,
    terms: &mut usize,
    column: &'static str,
    f: &StringFilter,
) {
    if let Some(v) = &f.equals {
        and(qb, terms);
        qb.push(column).push(" = ").push_bind(v.clone());
    }
    if let Some(v) = &f.contains {
        and(qb, terms);
        qb.push(column)
            .push(" LIKE ")
            .push_bind(format!("%{}%", escape_like(v)));
    }
    if let Some(v) = &f.starts_with {
        and(qb, terms);
        qb.push(column)
            .push(" LIKE ")
            .push_bind(format!("{}%", escape_like(v)));
    }
    if let Some(v) = &f.ends_with {
        and(qb, terms);
        qb.push(column)
            .push(" LIKE ")
            .push_bind(format!("%{}", escape_like(v)));
    }
}

fn push_int(
    qb: &mut QueryBuilder<'_, Postgres>,
    terms: &mut usize,
    column: &'static str,
    f: &IntFilter,
) {
    let ops = [
        ("=", f.equals),
        ("<", f.lt),
        ("<=", f.lte),
        (">", f.gt),
        (">=", f.gte),
    ];
    for (op, value) in ops {
        if let Some(v) = value {
            and(qb, terms);
            qb.push(column).push(" ").push(op).push(" ").push_bind(v);
        }
    }
}

/// Escape LIKE wildcards so user text matches literally.
/// Backslash is PostgreSQL's default LIKE escape character.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
