//! Prompt construction for LLM requests.
//!
//! The schema description is static: it is embedded at compile time rather
//! than introspected from the live database.

use crate::llm::types::Message;

/// Tables, columns and enumerated values the model may reference.
pub const SCHEMA_INFO: &str = r#"Database schema:
- Vendor: id, name, taxId, email, city, country, categoryId
- Customer: id, name, email, city, country
- Category: id, name
- Invoice: id, invoiceNumber, vendorId, customerId, categoryId, invoiceDate, dueDate, status, currency, subtotal, tax, discount, total, paidAmount
- InvoiceLineItem: id, invoiceId, description, quantity, unitPrice, total
- Payment: id, invoiceId, paymentDate, amount, method, reference
- Document: id, invoiceId, url, kind

Invoice status values: PENDING, APPROVED, PAID, PARTIALLY_PAID, OVERDUE, CANCELLED"#;

const SYSTEM_PROMPT: &str =
    "You are a SQL expert. Generate only valid PostgreSQL SELECT queries.";

const USER_PROMPT_TEMPLATE: &str = r#"You are a SQL expert. Given the following database schema and a question, generate a valid PostgreSQL SELECT query.

{schema}

Question: {question}

Generate a SQL query that answers this question. Only return the SQL query, nothing else.
The query should:
1. Only use SELECT statements (read-only queries)
2. ALWAYS use double-quoted table names: "Invoice", "Vendor", "Customer", "Category", "Payment", "Document", "InvoiceLineItem"
3. ALWAYS use double-quoted column names when they match the schema (e.g., "invoiceDate", "vendorId")
4. Include appropriate JOINs when needed
5. Use proper date functions for filtering
6. Limit results to a reasonable number (e.g., LIMIT 100)

IMPORTANT: Table names MUST be quoted with double quotes because they are case-sensitive in PostgreSQL.

SQL Query:"#;

/// Builds the user prompt with the schema and the verbatim question.
pub fn build_user_prompt(question: &str) -> String {
    // Question goes in last so braces inside it are never treated as placeholders.
    USER_PROMPT_TEMPLATE
        .replace("{schema}", SCHEMA_INFO)
        .replace("{question}", question)
}

/// Builds the complete message list for a synthesis request.
pub fn build_messages(question: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(build_user_prompt(question)),
    ]
}
