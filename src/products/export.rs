//! Unguarded product-listing exports: a server-rendered HTML page and a PDF
//! built from the same rows. PDF layout stays deliberately simple; rendering
//! internals are not this crate's business.

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

use super::repo::{self, Product};

#[instrument(skip(state))]
pub async fn html_list(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let products = repo::list_all(&state.db).await?;
    Ok(Html(render_products_html(&products)))
}

#[instrument(skip(state))]
pub async fn pdf_list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = repo::list_all(&state.db).await?;
    let bytes = render_products_pdf(&products)?;
    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes))
}

fn render_products_html(products: &[Product]) -> String {
    let rows: String = products
        .iter()
        .map(|p| {
            format!(
                "        <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>\n",
                p.id,
                html_escape(&p.name),
                html_escape(&p.description),
                p.quantity_in_stock,
                p.price,
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Product listing</title>
    <style>
        body {{ font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; margin: 24px; }}
        table {{ border-collapse: collapse; width: 100%; }}
        th, td {{ border: 1px solid #e5e7eb; padding: 8px 12px; text-align: left; }}
        th {{ background-color: #f3f4f6; }}
    </style>
</head>
<body>
    <h1>Product listing</h1>
    <table>
        <tr><th>#</th><th>Name</th><th>Description</th><th>In stock</th><th>Price</th></tr>
{rows}    </table>
</body>
</html>"#
    )
}

fn render_products_pdf(products: &[Product]) -> Result<Vec<u8>, ApiError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new("Product listing", Mm(210.0), Mm(297.0), "listing");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e.to_string())))?;
    let heading = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e.to_string())))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = 277.0;
    layer.use_text("Product listing", 16.0, Mm(20.0), Mm(y), &heading);
    y -= 12.0;

    for p in products {
        if y < 20.0 {
            let (page, layer_idx) = doc.add_page(Mm(210.0), Mm(297.0), "listing");
            layer = doc.get_page(page).get_layer(layer_idx);
            y = 277.0;
        }
        let line = format!(
            "#{}  {}  ({} in stock)  $ {:.2}",
            p.id, p.name, p.quantity_in_stock, p.price
        );
        layer.use_text(line, 11.0, Mm(20.0), Mm(y), &font);
        y -= 7.0;
    }

    doc.save_to_bytes()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e.to_string())))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
