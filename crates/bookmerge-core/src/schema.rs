//! Static description of the output tables

/// Columns of the canonical table, in output order
pub const CANONICAL_COLUMNS: &[&str] = &[
    "book_id",
    "titulo",
    "titulo_normalizado",
    "autor_principal",
    "autores",
    "editorial",
    "anio_publicacion",
    "fecha_publicacion",
    "idioma",
    "isbn10",
    "isbn13",
    "isbn13_valido",
    "paginas",
    "formato",
    "categorias",
    "precio",
    "moneda",
    "fuente_ganadora",
    "ts_ultima_actualizacion",
];

/// Fixed columns of the detail table; passthrough columns follow them
pub const DETAIL_COLUMNS: &[&str] = &[
    "source",
    "row_id",
    "title",
    "author_principal",
    "authors",
    "categories",
    "publisher",
    "pub_date",
    "language",
    "price_amount",
    "price_currency",
    "isbn10",
    "isbn13",
    "book_id_candidato",
    "timestamp_ingesta",
];

/// Markdown schema document written next to the quality report
pub fn schema_markdown() -> String {
    let mut doc = String::from("# Canonical model schema\n\n## standard/dim_book\n\n");
    for column in CANONICAL_COLUMNS {
        doc.push_str(&format!("- {}\n", column));
    }
    doc.push_str("\n## standard/book_source_detail\n\n");
    for column in DETAIL_COLUMNS {
        doc.push_str(&format!("- {}\n", column));
    }
    doc.push_str("- + every other field of the original source row\n");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lists_every_column() {
        let doc = schema_markdown();
        for column in CANONICAL_COLUMNS.iter().chain(DETAIL_COLUMNS) {
            assert!(doc.contains(&format!("- {}\n", column)), "missing {}", column);
        }
    }

    #[test]
    fn test_reserved_columns_present() {
        assert!(CANONICAL_COLUMNS.contains(&"paginas"));
        assert!(CANONICAL_COLUMNS.contains(&"formato"));
    }
}
