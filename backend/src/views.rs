//! Server-rendered HTML pages.

use serde::{Deserialize, Serialize};
use shared::{Priority, Task, TaskFilter, TaskStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// One-shot message shown after a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub notice: String,
    pub level: NoticeLevel,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            notice: message.into(),
            level: NoticeLevel::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            notice: message.into(),
            level: NoticeLevel::Error,
        }
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, notice: Option<&Notice>, body: &str) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title} · Task Board</title>\n\
         <link rel=\"stylesheet\" href=\"/static/style.css\">\n\
         </head>\n<body>\n<header>\n<h1><a href=\"/\">Task Board</a></h1>\n\
         <nav><a href=\"/\">Tasks</a> <a href=\"/stats\">Statistics</a> <a href=\"/api/tasks\">JSON</a></nav>\n\
         </header>\n<main>\n",
        title = escape(title),
    );
    if let Some(notice) = notice {
        let class = match notice.level {
            NoticeLevel::Success => "notice notice-success",
            NoticeLevel::Error => "notice notice-error",
        };
        html.push_str(&format!(
            "<p class=\"{class}\">{}</p>\n",
            escape(&notice.notice)
        ));
    }
    html.push_str(body);
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn add_form() -> String {
    let mut options = String::new();
    for priority in Priority::ALL {
        let selected = if priority == Priority::Normal { " selected" } else { "" };
        options.push_str(&format!(
            "<option value=\"{value}\"{selected}>{icon} {value}</option>",
            value = priority.as_str(),
            icon = priority.icon(),
        ));
    }
    format!(
        "<form class=\"add-form\" method=\"post\" action=\"/add\">\n\
         <input type=\"text\" name=\"title\" placeholder=\"What needs doing?\" required>\n\
         <select name=\"priority\">{options}</select>\n\
         <button type=\"submit\">Add Task</button>\n\
         </form>\n"
    )
}

fn filter_links(active: TaskFilter) -> String {
    let mut links = String::from("<nav class=\"filters\">");
    for filter in [
        TaskFilter::All,
        TaskFilter::Pending,
        TaskFilter::Completed,
        TaskFilter::High,
    ] {
        let class = if filter == active { " class=\"active\"" } else { "" };
        links.push_str(&format!(
            "<a href=\"/filter/{}\"{class}>{}</a> ",
            filter.slug(),
            filter.page_title()
        ));
    }
    links.push_str("</nav>\n");
    links
}

fn task_item(task: &Task) -> String {
    let state = if task.completed { "done" } else { "open" };
    let complete = if task.completed {
        String::new()
    } else {
        format!("<a class=\"complete\" href=\"/complete/{}\">Complete</a> ", task.id)
    };
    format!(
        "<li class=\"task {state} priority-{priority}\">\
         <span class=\"label\">{label}</span>\
         <time datetime=\"{iso}\">{created}</time>\
         <span class=\"actions\">{complete}<a class=\"delete\" href=\"/delete/{id}\">Delete</a></span>\
         </li>\n",
        priority = task.priority.as_str(),
        label = escape(&task.to_string()),
        iso = task.created_at.to_rfc3339(),
        created = task.created_at.format("%Y-%m-%d %H:%M"),
        id = task.id,
    )
}

/// Task list page, used for `/` and every `/filter/:status` view.
pub fn index_page(tasks: &[Task], filter: TaskFilter, notice: Option<&Notice>) -> String {
    let mut body = add_form();
    body.push_str(&filter_links(filter));
    body.push_str(&format!("<h2>{}</h2>\n", filter.page_title()));
    if tasks.is_empty() {
        body.push_str("<p class=\"empty\">No tasks here yet.</p>\n");
    } else {
        body.push_str("<ul class=\"tasks\">\n");
        for task in tasks {
            body.push_str(&task_item(task));
        }
        body.push_str("</ul>\n");
    }
    layout(filter.page_title(), notice, &body)
}

pub fn stats_page(stats: &TaskStats, notice: Option<&Notice>) -> String {
    let rows = [
        ("Total", stats.total.to_string()),
        ("Completed", stats.completed.to_string()),
        ("Pending", stats.pending.to_string()),
        ("Completion rate", format!("{:.1}%", stats.completion_rate)),
        ("🔥 High priority", stats.high_priority.to_string()),
        ("⭐ Normal priority", stats.normal_priority.to_string()),
        ("💤 Low priority", stats.low_priority.to_string()),
    ];
    let mut body = String::from("<h2>Statistics</h2>\n<dl class=\"stats\">\n");
    for (label, value) in rows {
        body.push_str(&format!("<dt>{label}</dt><dd>{value}</dd>\n"));
    }
    body.push_str("</dl>\n");
    body.push_str(&format!(
        "<div class=\"progress\"><div class=\"bar\" style=\"width: {:.1}%\"></div></div>\n",
        stats.completion_rate
    ));
    layout("Statistics", notice, &body)
}
