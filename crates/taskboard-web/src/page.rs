//! HTML rendering of the board.

use std::fmt::Write as _;

use taskboard_core::app::{BoardState, ListView};
use taskboard_core::domain::Task;

pub const LOADING_TEXT: &str = "Loading tasks...";
pub const EMPTY_TEXT: &str = "No tasks available yet";

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_board(state: &BoardState) -> String {
    let mut html = String::from(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>Tasks</title></head><body>\n",
    );

    let _ = write!(
        html,
        "<h1>Tasks</h1>\n\
         <form method=\"post\" action=\"/tasks\">\n\
         <input name=\"title\" placeholder=\"Title\" required value=\"{}\">\n\
         <input name=\"description\" placeholder=\"Description\" required value=\"{}\">\n\
         <button type=\"submit\">Create</button>\n\
         </form>\n",
        escape(&state.draft.title),
        escape(&state.draft.description),
    );

    match state.list_view() {
        ListView::Loading => {
            let _ = writeln!(html, "<p>{LOADING_TEXT}</p>");
        }
        ListView::Empty => {
            let _ = writeln!(html, "<p>{EMPTY_TEXT}</p>");
        }
        ListView::Tasks(tasks) => {
            html.push_str("<ul>\n");
            for task in tasks {
                render_row(&mut html, task);
            }
            html.push_str("</ul>\n");
        }
    }

    if let Some(task) = state.edit_surface() {
        render_edit_modal(&mut html, task);
    }

    html.push_str("</body></html>\n");
    html
}

fn render_row(html: &mut String, task: &Task) {
    let _ = write!(
        html,
        "<li><strong>{title}</strong> {description}\n\
         <form method=\"post\" action=\"/tasks/{id}/edit\"><button>Edit</button></form>\n\
         <form method=\"post\" action=\"/tasks/{id}/delete\"><button>Delete</button></form>\n\
         </li>\n",
        title = escape(&task.title),
        description = escape(&task.description),
        id = task.id,
    );
}

fn render_edit_modal(html: &mut String, task: &Task) {
    let _ = write!(
        html,
        "<dialog open id=\"edit\">\n\
         <form method=\"post\" action=\"/tasks/edit\">\n\
         <input name=\"title\" required value=\"{}\">\n\
         <input name=\"description\" required value=\"{}\">\n\
         <button type=\"submit\">Save</button>\n\
         </form>\n\
         <form method=\"post\" action=\"/tasks/edit/cancel\"><button>Cancel</button></form>\n\
         </dialog>\n",
        escape(&task.title),
        escape(&task.description),
    );
}

pub fn render_message(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{t}</title></head>\
         <body><h1>{t}</h1><p>{b}</p></body></html>\n",
        t = escape(title),
        b = escape(body),
    )
}
