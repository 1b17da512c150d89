//! Typed ABI bindings for the two platform contracts.
//!
//! The function signatures and fixed price constants are defined by the
//! deployed contracts; they are configuration here, never re-derived.

use alloy_sol_types::sol;

sol! {
    /// Diploma registry: NFT-style diploma tokens plus the role records
    /// (students, schools, companies) the dashboard reads.
    contract DiplomaRegistry {
        function nextTokenId() external view returns (uint256);
        function accreditedSchools(address school) external view returns (bool);
        function diplomaDetails(uint256 tokenId) external view returns (
            string studentName,
            string diplomaTitle,
            string institution,
            string issueDate,
            string ipfsCID
        );
        function students(address student) external view returns (
            uint256 id,
            string lastName,
            string firstName,
            string email
        );
        function companies(address company) external view returns (
            uint256 id,
            string name,
            string country
        );
        function diplomaToSchool(uint256 tokenId) external view returns (address);
        function schools(address school) external view returns (string name);
        function ownerOf(uint256 tokenId) external view returns (address);
        function balanceOf(address owner) external view returns (uint256);
        function tokenURI(uint256 tokenId) external view returns (string);

        function addSchool(address school) external;
        function mintDiploma(
            address to,
            string studentName,
            string diplomaTitle,
            string institution,
            string issueDate,
            string ipfsCID
        ) external;
        function safeTransferFrom(address from, address to, uint256 tokenId) external;

        event DiplomaMinted(address indexed to, uint256 indexed tokenId, string studentName);
    }

    /// Fungible reward/payment token (DVT) with the platform-specific
    /// purchase, payment and reward entry points.
    contract RewardToken {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function owner() external view returns (address);

        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function buyTokens() external payable;
        function rewardForEvaluation(address company) external;
        function payForVerification(address diplomaDApp) external;

        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}
