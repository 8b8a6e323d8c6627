pub mod routes {
    pub mod checkout;
    pub mod webhook;
}

pub mod services {
    pub mod checkout;
    pub mod webhook;
}

pub mod dtos {
    pub mod checkout;
}

pub mod mount;
