//! Instruction templates for the reasoning service.
//!
//! Each template names the exact JSON field names the mapper reads and
//! asks for `"Not Found"` wherever the document is silent.

use super::{ChatMessage, DocumentTag};

const LEASE_SHAPE: &str = r#"{
  "Lease Type": "Type of lease or contract",
  "Description": "High level, short description of document",
  "Property Information": {
    "Address": "Complete property address",
    "Num Bedrooms": null,  // Integer or null if not specified/commercial
    "Num Bathrooms": null,  // Integer or null if not specified/commercial
    "Num Floors": null,     // Integer or null if not specified
    "Is Commercial": false,  // Boolean, true if commercial property
    "Property Type": "Type of property (e.g., apartment, house, office, retail)"
  },
  "Rent Amount": {
    "Total": "Total rent for the lease period",
    "Monthly Installment": "Monthly rent installment"
  },
  "Security Deposit": {
    "Amount": "Security deposit amount or 'Not Found' if absent",
    "Held By": "Entity holding the deposit or 'Not Found' if absent"
  },
  "Start Date": "Start date of the lease MM/DD/YYYY",
  "End Date": "End date of the lease MM/DD/YYYY",
  "Tenant Information": {
    "First Name": "First name of tenant",
    "Last Name": "Last name of tenant",
    "Landlord": "Name of landlord",
    "Address": "Tenant address",
    "Email": "Tenant email",
    "Phone Number": "Tenant phone number",
    "Date of Birth": "Tenant date of birth MM/DD/YYYY",
    "Status": "current", "late", or "previous"
  },
  "Payment Frequency": "Frequency of rent payments (e.g., Monthly, Quarterly)",
  "Special Lease Terms": {
    "Late Payment": {
      "Initial Fee": "Initial late payment fee or 'Not Found' if absent",
      "Daily Late Charge": "Daily charge for late payment or 'Not Found' if absent"
    },
    "Additional Fees": [
      {"Fee Type": "Type of fee, e.g., 'After-Hours Lockout'", "Amount": "Fee amount"},
      {"Fee Type": "Type of fee, e.g., 'Animal Violation'", "First Violation": "Amount for first violation", "Additional Violation": "Amount for subsequent violations"},
      {"Fee Type": "Type of fee, e.g., 'Contract Re-Assignment'", "Amount": "Fee amount"},
      {"Fee Type": "Type of fee, e.g., 'Garbage Removal'", "Amount": "Fee amount and applicable rate, e.g., '$50.00 per item/bag per day'"},
      {"Fee Type": "Type of fee, e.g., 'Holdover Resident'", "Amount": "Fee amount and applicable rate, e.g., '150% of Daily Rate per day'"}
    ]
  }
}"#;

const INVOICE_SHAPE: &str = r#"{
  "Invoice Number": "Unique invoice number",
  "Amount": "Total amount due",
  "Paid Amount": "Amount already paid",
  "Invoice Date": "Date of the invoice MM/DD/YYYY",
  "Due Date": "Due date for payment MM/DD/YYYY",
  "Status": "Status of the invoice (e.g., Unpaid, Paid)",
  "Vendor Information": {
    "Name": "Name of the vendor or supplier",
    "Address": "Vendor address"
  },
  "Description": "Description of goods or services provided",
  "Line Items": [
    {
      "Description": "Item description",
      "Quantity": "Number of units",
      "Unit Price": "Price per unit",
      "Total Price": "Total price for this item"
    },
    {
      ...
    }
  ]
}"#;

const CONTRACT_SHAPE: &str = r#"{
  "Contract Type": "Type of contract (e.g., Service Agreement, Maintenance Contract)",
  "Description": "High-level, short description of the contract",
  "Start Date": "Start date of the contract MM/DD/YYYY",
  "End Date": "End date of the contract MM/DD/YYYY or 'Not Found' if indefinite",
  "Parties Involved": [
    {
      "Name": "Name of the party",
      "Address": "Party address",
      "Contact Person": "Name of the contact person",
      "Phone Number": "Contact phone number",
      "Email": "Contact email address",
      "Role": "Party's Role"
    },
    { ... }
  ],
  "Vendor Information": {
    "Name": "Name of the vendor or service provider",
    "Address": "Vendor address",
    "Contact Person": "Name of the contact person at the vendor",
    "Phone Number": "Contact phone number",
    "Email": "Contact email address"
  },
  "Terms": {
    "Payment Terms": "Details about payment schedules, amounts, and methods",
    "Termination Clause": "Conditions under which the contract can be terminated",
    "Confidentiality Clause": "Any confidentiality or non-disclosure agreements",
    "Liability Clause": "Details about liability limitations",
    "Dispute Resolution": "Methods for resolving disputes",
    "Other Terms": "Any other significant terms and conditions"
  },
  "Is Active": "True if the contract is currently active, False otherwise"
}"#;

const CLASSIFY_SYSTEM: &str = "You are an intelligent assistant trained to classify documents into one of the following categories: \
'Lease', 'Contract', or 'Invoice'. You must strictly adhere to the definitions and instructions provided below.";

const CLASSIFY_INSTRUCTIONS: &str = "Based on the following document text, determine if it is a 'Lease', 'Contract', or 'Invoice'. \
Please classify the document according to the definitions and examples provided below:

### Definitions:

1. **Lease**:
   - **Purpose**: A legally binding agreement specifically related to the rental of property or equipment.
   - **Key Terms**: 'tenant', 'landlord', 'rent amount', 'lease period', 'security deposit', 'start date', 'end date', 'premises', 'maintenance', 'occupancy terms'.
   - **Characteristics**: Includes detailed terms about the use of property, payment schedules, responsibilities for maintenance, and clauses about occupancy and termination specific to rental agreements.

2. **Contract**:
   - **Purpose**: A formal and legally binding agreement between two or more parties outlining mutual obligations, rights, and responsibilities.
   - **Key Terms**: 'agreement', 'party', 'signatures', 'terms and conditions', 'obligations', 'deliverables', 'service terms'.
   - **Characteristics**: Broad in scope and can pertain to various types of agreements such as service agreements, purchase agreements, employment contracts, etc. Unlike leases, contracts are not limited to property rentals and do not typically include rental-specific terms.

3. **Invoice**:
   - **Purpose**: A document issued by a seller to a buyer that specifies the products or services provided, along with the amount due.
   - **Key Terms**: 'invoice number', 'amount due', 'due date', 'line items', 'description of goods or services', 'vendor information', 'payment terms'.
   - **Characteristics**: Contains detailed billing information, including quantities, prices, and payment instructions. Primarily used for billing purposes.

### Examples:

**Lease Example**:

This Housing Contract (\u{201c}Contract\u{201d}) is made and entered into as of 09/20/2023 (\u{201c}Effective Date\u{201d}) by and between Landlord and Resident, upon the terms and conditions stated below. ... [Lease-specific content]

**Contract Example**:

This Service Agreement (\u{201c}Agreement\u{201d}) is entered into on 01/01/2024 by and between ABC Services (\u{201c}Provider\u{201d}) and XYZ Company (\u{201c}Client\u{201d}). ... [Contract-specific content]

**Invoice Example**:

Invoice Number: 12345
Date: 10/01/2023
Due Date: 10/15/2023
Description: Web Design Services
Amount Due: $2,000.00
... [Invoice-specific content]

### Instructions:

1. **Classification Priority**: If the document is a specific type of contract, such as a lease, it should be classified as 'Lease' rather than the more general 'Contract'.
2. **Response Format**: Please return your answer in JSON format as {'document_type': 'Lease'}, {'document_type': 'Contract'}, or {'document_type': 'Invoice'}.

### Document Text to Analyze:

";

/// Messages asking for the fields of a `tag` document found in `text`.
pub fn extraction_messages(text: &str, tag: &DocumentTag) -> Vec<ChatMessage> {
    match tag {
        DocumentTag::Lease => shaped(
            "lease",
            "The 'Additional Fees' and 'Special Lease Terms' fields should include any relevant \
             entries found in the document, not limited to specific examples.",
            LEASE_SHAPE,
            text,
        ),
        DocumentTag::Invoice => shaped(
            "invoice",
            "For 'Line Items', list each item purchased with its details.",
            INVOICE_SHAPE,
            text,
        ),
        DocumentTag::Contract => shaped(
            "contract",
            "The 'Terms' field should include any relevant clauses found in the document, with each \
             term represented as a key-value pair. The 'Parties Involved' should be a list of parties, \
             with each party represented as an object containing their details.",
            CONTRACT_SHAPE,
            text,
        ),
        DocumentTag::Other(name) => vec![
            ChatMessage::system(format!(
                "You are an assistant that extracts information from {name}s."
            )),
            ChatMessage::user(format!(
                "Extract the relevant information from the following {name} \
                 and provide it in JSON format:\n\n{text}"
            )),
        ],
    }
}

/// Messages asking for a three-way Lease/Contract/Invoice classification.
pub fn classification_messages(text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(CLASSIFY_SYSTEM),
        ChatMessage::user(format!("{CLASSIFY_INSTRUCTIONS}{text}")),
    ]
}

fn shaped(kind: &str, guidance: &str, shape: &str, text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "You are an assistant that extracts {kind} information and formats it as JSON."
        )),
        ChatMessage::user(format!(
            "Please extract the following details from the {kind} and return them in JSON format \
             exactly as shown. If any information is missing, use 'Not Found' for that field. \
             {guidance}\n\n{shape}\n\nText to analyze:\n\n{text}"
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_name_mapped_fields() {
        let lease = extraction_messages("TEXT", &DocumentTag::Lease);
        assert_eq!(lease.len(), 2);
        assert_eq!(lease[0].role, "system");
        for field in ["Rent Amount", "Security Deposit", "Tenant Information", "Special Lease Terms"] {
            assert!(lease[1].content.contains(field), "lease prompt lacks {field}");
        }
        assert!(lease[1].content.ends_with("Text to analyze:\n\nTEXT"));

        let invoice = extraction_messages("TEXT", &DocumentTag::Invoice);
        assert!(invoice[1].content.contains("\"Line Items\""));
        assert!(invoice[1].content.contains("'Not Found'"));

        let contract = extraction_messages("TEXT", &DocumentTag::Contract);
        assert!(contract[1].content.contains("\"Parties Involved\""));
        assert!(contract[1].content.contains("\"Is Active\""));
    }

    #[test]
    fn test_generic_template() {
        let messages = extraction_messages("water usage", &DocumentTag::Other("utility bill".into()));
        assert_eq!(
            messages[0].content,
            "You are an assistant that extracts information from utility bills."
        );
        assert!(messages[1].content.ends_with("JSON format:\n\nwater usage"));
    }

    #[test]
    fn test_classification_template() {
        let messages = classification_messages("Invoice Number: 9");
        assert!(messages[0].content.contains("'Lease', 'Contract', or 'Invoice'"));
        assert!(messages[1].content.ends_with("### Document Text to Analyze:\n\nInvoice Number: 9"));
    }
}
