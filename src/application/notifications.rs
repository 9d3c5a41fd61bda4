use crate::domain::complaint::Complaint;
use crate::infrastructure::EmailMessage;

/// Escapes text for inclusion in an HTML email body.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

/// Alert to a department or super admin that a complaint arrived.
pub fn new_complaint(recipient: &str, complaint: &Complaint) -> EmailMessage {
    EmailMessage {
        to: recipient.to_string(),
        subject: format!(
            "New Complaint: {} - {}",
            complaint.category, complaint.student_name
        ),
        html: format!(
            "<h3>New Complaint Received</h3>\
             <p><strong>Student:</strong> {} ({})</p>\
             <p><strong>Category:</strong> {}</p>\
             <p><strong>Description:</strong> {}</p>\
             <p>Please login to the dashboard to take action.</p>",
            escape_html(&complaint.student_name),
            escape_html(&complaint.student_email),
            complaint.category,
            escape_html(&complaint.description),
        ),
    }
}

/// Tells the submitter their complaint moved to a new status.
pub fn status_update(complaint: &Complaint) -> EmailMessage {
    EmailMessage {
        to: complaint.student_email.clone(),
        subject: format!("Complaint Status Updated: {}", complaint.status),
        html: format!(
            "<h3>Your Complaint Status Has Changed</h3>\
             <p><strong>Category:</strong> {}</p>\
             <p><strong>New Status:</strong> {}</p>\
             <p><strong>Remarks:</strong> {}</p>\
             <p><strong>Assigned To:</strong> {}</p>",
            complaint.category,
            complaint.status,
            escape_html(or_default(&complaint.remarks, "No remarks provided.")),
            escape_html(or_default(&complaint.assigned_to, "Unassigned")),
        ),
    }
}
