pub mod document_requests;
